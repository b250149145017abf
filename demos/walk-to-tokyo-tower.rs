//! Walks a scripted observer from Shiba Park up to Tokyo Tower and prints where each marker would
//! be drawn along the way.
//!
//! Run with `RUST_LOG=geoanchor=trace` to see every placement as it is computed.

use geoanchor::{
    CameraPose, GeoPoint, LocationSample, LocationStatus, PlacementEngine, ScriptedLocation,
    TargetConfig, TargetRegistry, TickOutcome, WorldPoint,
};
use tracing_subscriber::EnvFilter;
use uom::si::angle::degree;
use uom::si::f64::Angle;

fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("geoanchor=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let registry = TargetRegistry::initialize([
        TargetConfig::new("tokyo-tower", 35.6586, 139.7454, 150., "tower-marker"),
        TargetConfig::new("zojoji", 35.6575, 139.7484, 18., "temple-marker"),
        TargetConfig::new("shiba-park-station", 35.6545, 139.7496, 5., "station-marker"),
    ])
    .expect("demo targets are valid");

    // the AR session started while the device faced 340° by compass, so the session's forward
    // axis points that way. whenever the device turns, the compass heading and the camera yaw in
    // the session change together.
    const SESSION_HEADING: f64 = 340.;

    // the first reading arrives before the GPS has a fix; then a stroll north-west, glancing
    // around on the way
    let mut walk = ScriptedLocation::new([LocationSample::without_fix(LocationStatus::Starting)]);
    let waiting = CameraPose::new(WorldPoint::from_meters(0., 1.5, 0.), Angle::new::<degree>(0.));
    let mut cameras = vec![waiting];
    let steps = [
        (35.6540, 139.7480, 12., 340.),
        (35.6550, 139.7474, 14., 330.),
        (35.6560, 139.7468, 16., 300.),
        (35.6570, 139.7462, 18., 20.),
        (35.6578, 139.7458, 21., 350.),
    ];
    for (latitude, longitude, altitude, heading) in steps {
        let here = GeoPoint::from_degrees(latitude, longitude, altitude).expect("in range");
        walk.push(LocationSample::running(here, Angle::new::<degree>(heading)));

        // markers are re-placed around the camera every frame, so where the camera has wandered
        // to in the session does not matter; keep it put
        cameras.push(CameraPose::new(
            WorldPoint::from_meters(0., 1.5, 0.),
            Angle::new::<degree>(heading - SESSION_HEADING),
        ));
    }

    let mut engine = PlacementEngine::new(walk, registry);

    loop {
        let frame = engine.provider().position();
        let camera = cameras[frame];
        println!("frame {frame}:");

        let mut print = |marker: &&'static str, position: WorldPoint, look_at: WorldPoint| {
            println!("  {marker:<16} at {position}, facing {look_at}");
        };
        match engine.tick(camera, &mut print) {
            TickOutcome::Placed { count } => println!("  ({count} markers placed)"),
            TickOutcome::Skipped(reason) => println!("  (skipped: {reason})"),
        }

        if !engine.provider_mut().advance() {
            break;
        }
    }
}
