//! Drive a simulated vehicle along a smoothed path using the drive controller.

use approx::assert_relative_eq;
use nalgebra::{UnitQuaternion, Vector3};

use comms_if::{
    eqpt::drive::Twist,
    tc::{
        path::{PathRequest, PathResponse},
        pd_params::PdProfile,
    },
};
use util::maths::wrap_pi;
use veh_lib::{
    drive_ctrl::{DriveCtrl, DriveCtrlParams, MotionParams, PdGains},
    path_smoother::{PathSmoother, PathSmootherParams},
};

/// Number of smoothed points between the closest point and the carrot.
const CARROT_LOOKAHEAD: usize = 5;

const DT_S: f64 = 0.1;

fn test_ctrl_params() -> DriveCtrlParams {
    DriveCtrlParams {
        motion: MotionParams {
            max_controller_speed_ms: 0.6,
            max_unlimited_speed_ms: 1.0,
            max_controller_angular_rate_rads: 1.2,
            max_unlimited_angular_rate_rads: 2.0,
            pd_profile: PdProfile::Default,
            y_symmetric: false,
            commanded_speed_ms: 0.4,
        },
        gains: PdGains::default(),
    }
}

/// A planar unicycle.
struct Vehicle {
    position_m: Vector3<f64>,
    heading_rad: f64,
}

impl Vehicle {
    fn step(&mut self, twist: &Twist, dt: f64) {
        self.heading_rad = wrap_pi(self.heading_rad + twist.angular_z * dt);
        self.position_m += Vector3::new(self.heading_rad.cos(), self.heading_rad.sin(), 0.0)
            * twist.linear_x
            * dt;
    }
}

fn closest_index(positions_m: &[Vector3<f64>], point: &Vector3<f64>) -> usize {
    let mut best = 0;
    let mut best_dist = std::f64::INFINITY;

    for (i, p) in positions_m.iter().enumerate() {
        let d = (p - point).norm();
        if d < best_dist {
            best = i;
            best_dist = d;
        }
    }

    best
}

#[test]
fn test_track_smoothed_path() {
    let smoother = PathSmoother::new(PathSmootherParams::new(false)).unwrap();
    let path = vec![
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(1.0, 1.0, 0.0),
    ];
    let end = UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2);

    let traj = smoother
        .smooth(&path, &UnitQuaternion::identity(), &end, false)
        .unwrap();
    assert!(!traj.reverse);

    let params = test_ctrl_params();
    let mut ctrl = DriveCtrl::from_params(params).unwrap();
    ctrl.reset_session();

    let goal = traj.positions_m[traj.len() - 1];
    let mut vehicle = Vehicle {
        position_m: traj.positions_m[0],
        heading_rad: 0.0,
    };

    for _ in 0..400 {
        let closest = closest_index(&traj.positions_m, &vehicle.position_m);
        let carrot = traj.positions_m[(closest + CARROT_LOOKAHEAD).min(traj.len() - 1)];

        let to_carrot = carrot - vehicle.position_m;
        let distance = to_carrot.norm();
        let relative_angle = wrap_pi(to_carrot.y.atan2(to_carrot.x) - vehicle.heading_rad);

        let (twist, pd_out) = ctrl
            .execute_motion_command(
                relative_angle,
                relative_angle,
                distance,
                params.motion.commanded_speed_ms,
                distance,
                DT_S,
            )
            .unwrap();

        assert!(twist.linear_x.abs() <= params.motion.max_controller_speed_ms);
        assert!(twist.angular_z.abs() <= params.motion.max_controller_angular_rate_rads);
        assert!(pd_out.speed.abs() <= params.motion.commanded_speed_ms);

        vehicle.step(&twist, DT_S);
    }

    assert!((vehicle.position_m - goal).norm() < 0.25);

    assert!(ctrl.stop().is_zero());
}

#[test]
fn test_request_file() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../data/path_request.json");
    let request: PathRequest =
        serde_json::from_reader(std::fs::File::open(path).unwrap()).unwrap();

    let smoother = PathSmoother::new(PathSmootherParams::new(true)).unwrap();
    let response = smoother.smooth_request(&request).unwrap();

    // 3 m path at 5 cm spacing, plus the final waypoint
    assert_eq!(response.positions_m.len(), 61);
    assert_eq!(response.positions_m[0], request.points_m[0]);
    assert_eq!(response.positions_m[60], request.points_m[3]);
    assert_eq!(response.orientations[0], request.start_orientation);
    assert_eq!(response.orientations[60], request.end_orientation);

    // Too long to reverse
    assert!(!response.reverse);

    // The response survives a trip through JSON
    let json = serde_json::to_string(&response).unwrap();
    let parsed: PathResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.positions_m.len(), response.positions_m.len());
    assert_relative_eq!(
        parsed.positions_m[30],
        response.positions_m[30],
        epsilon = 1e-12
    );
}
