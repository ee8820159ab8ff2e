//! Runs the acquirer over the recorded walk shipped in `demos/`.

use std::path::Path;

use medrush_geo::{acquire, AcquireOptions, AccuracyTier, ReplayScript, ReplaySensor};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn demo_walk_settles_on_sub_hundred_metre_reading() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/street-walk.json");
    let script = ReplayScript::from_file(&path).expect("demo script should parse");
    let sensor = ReplaySensor::from_script(script);

    let fix = acquire(
        &sensor,
        &AcquireOptions::default().without_delays(),
        &CancellationToken::new(),
    )
    .await
    .into_fix()
    .expect("not cancelled");

    assert!(!fix.is_fallback());
    assert!((fix.sample.accuracy_meters - 42.5).abs() < f64::EPSILON);
    assert_eq!(fix.attempts_made, 5);
    assert_eq!(fix.accuracy_tier(), AccuracyTier::Good);
    assert_eq!(sensor.remaining(), 0);
}
