//! Control routes
//!
//! Static table from lower-cased path to handler. Handlers run on the scene
//! thread with exclusive access to [`SceneContext`] and answer with plain
//! text; validation failures are reported in the body with a 200 status.

use std::collections::HashMap;

use axum::http::StatusCode;

use super::request::ControlRequest;
use crate::scene::{parse_real, DirectoryError, SceneContext, Vec3};

/// Body returned by `/`
pub const WELCOME_TEXT: &str = "Welcome to Scenecast HTTP Server";

/// Body returned for unknown paths
pub const NOT_FOUND_TEXT: &str = "404 Not Found";

/// Route handler
pub type Handler = fn(&ControlRequest, &mut SceneContext) -> String;

/// Handler result as sent to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ControlResponse {
    pub fn ok(body: String) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: NOT_FOUND_TEXT.to_string(),
        }
    }
}

/// Route table
#[derive(Clone, Default)]
pub struct ControlRouter {
    routes: HashMap<String, Handler>,
}

impl std::fmt::Debug for ControlRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut paths: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        f.debug_struct("ControlRouter").field("routes", &paths).finish()
    }
}

impl ControlRouter {
    /// Empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with the camera control routes
    pub fn with_default_routes() -> Self {
        Self::new()
            .route("/", home)
            .route("/cameras", list_cameras)
            .route("/rotate", rotate_camera)
            .route("/create-camera", create_camera)
    }

    /// Register `handler` for `path` (matched case-insensitively)
    pub fn route(mut self, path: &str, handler: Handler) -> Self {
        self.routes.insert(path.to_lowercase(), handler);
        self
    }

    /// Exact, case-insensitive lookup
    pub fn resolve(&self, path: &str) -> Option<Handler> {
        self.routes.get(&path.to_lowercase()).copied()
    }

    /// Resolve and run a request; must be called on the scene thread
    pub fn dispatch(&self, request: &ControlRequest, ctx: &mut SceneContext) -> ControlResponse {
        match self.resolve(request.path()) {
            Some(handler) => ControlResponse::ok(handler(request, ctx)),
            None => ControlResponse::not_found(),
        }
    }
}

fn home(_req: &ControlRequest, _ctx: &mut SceneContext) -> String {
    WELCOME_TEXT.to_string()
}

fn list_cameras(_req: &ControlRequest, ctx: &mut SceneContext) -> String {
    format!("Cameras:\n{}", ctx.directory().list().join("\n"))
}

fn rotate_camera(req: &ControlRequest, ctx: &mut SceneContext) -> String {
    let (Some(name), Some(axis), Some(angle)) =
        (req.param("name"), req.param("axis"), req.param("angle"))
    else {
        return "Missing parameters: name, axis, or angle.".to_string();
    };

    match ctx.directory_mut().rotate(name, axis, angle) {
        Ok(axis) => {
            let degrees = parse_real(angle).unwrap_or_default();
            format!(
                "Rotated camera '{}' around {}-axis by {} degrees.",
                name, axis, degrees
            )
        }
        Err(e) => e.to_string(),
    }
}

fn create_camera(req: &ControlRequest, ctx: &mut SceneContext) -> String {
    let (Some(name), Some(x), Some(y), Some(z)) = (
        req.param("name"),
        req.param("x"),
        req.param("y"),
        req.param("z"),
    ) else {
        return "Missing parameters: name, x, y, or z.".to_string();
    };

    let (Some(x), Some(y), Some(z)) = (parse_real(x), parse_real(y), parse_real(z)) else {
        return "Invalid coordinate values.".to_string();
    };

    if ctx.directory().exists(name) {
        return DirectoryError::AlreadyExists(name.to_string()).to_string();
    }

    let camera = name.to_string();
    let position = Vec3::new(x, y, z);
    ctx.defer(move |ctx| match ctx.create_camera(&camera, position) {
        Ok(()) => tracing::info!(camera = %camera, position = %position, "Created camera"),
        Err(e) => tracing::warn!(camera = %camera, error = %e, "Camera creation skipped"),
    });

    format!("Creating camera '{}' at {}...", name, position)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use std::time::Duration;

    use tokio::task::LocalSet;

    use super::*;
    use crate::scene::CameraDirectory;
    use crate::session::{PublishState, PublisherConfig, SessionCoordinator};
    use crate::transport::fake::FakeTransport;

    fn scene() -> SceneContext {
        let mut directory = CameraDirectory::new();
        directory.create("MainCamera", Vec3::ZERO).unwrap();
        let config = PublisherConfig::default().settle_delay(Duration::from_secs(60));
        SceneContext::new(
            directory,
            SessionCoordinator::new(config, Rc::new(FakeTransport::default())),
        )
    }

    fn get(router: &ControlRouter, ctx: &mut SceneContext, uri: &str) -> ControlResponse {
        let uri: axum::http::Uri = uri.parse().unwrap();
        let response = router.dispatch(&ControlRequest::from_uri(&uri), ctx);
        ctx.run_deferred();
        response
    }

    #[test]
    fn test_resolve_case_insensitive() {
        let router = ControlRouter::with_default_routes();

        assert!(router.resolve("/cameras").is_some());
        assert!(router.resolve("/CAMERAS").is_some());
        assert!(router.resolve("/Create-Camera").is_some());
        assert!(router.resolve("/cameras/").is_none());
        assert!(router.resolve("/unknown").is_none());
    }

    #[test]
    fn test_home_and_not_found() {
        let router = ControlRouter::with_default_routes();
        let mut ctx = scene();

        assert_eq!(
            get(&router, &mut ctx, "/"),
            ControlResponse::ok("Welcome to Scenecast HTTP Server".into())
        );

        let missing = get(&router, &mut ctx, "/nope");
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.body, "404 Not Found");
    }

    #[test]
    fn test_list_cameras() {
        let router = ControlRouter::with_default_routes();
        let mut ctx = scene();
        ctx.directory_mut().create("Cam2", Vec3::ZERO).unwrap();

        let response = get(&router, &mut ctx, "/cameras");
        assert_eq!(response.body, "Cameras:\nMainCamera\nCam2");
    }

    #[test]
    fn test_rotate_messages() {
        let router = ControlRouter::with_default_routes();
        let mut ctx = scene();

        let cases = [
            ("/rotate?name=MainCamera&axis=y", "Missing parameters: name, axis, or angle."),
            ("/rotate?name=Nobody&axis=q&angle=abc", "Camera 'Nobody' not found."),
            ("/rotate?name=MainCamera&axis=w&angle=45", "Invalid axis. Use x, y or z."),
            ("/rotate?name=MainCamera&axis=y&angle=abc", "Invalid angle value."),
            (
                "/rotate?name=maincamera&axis=Y&angle=45",
                "Rotated camera 'maincamera' around y-axis by 45 degrees.",
            ),
        ];

        for (uri, expected) in cases {
            let response = get(&router, &mut ctx, uri);
            assert_eq!(response.status, StatusCode::OK, "{}", uri);
            assert_eq!(response.body, expected, "{}", uri);
        }

        let forward = ctx.directory().get("MainCamera").unwrap().transform.forward();
        assert!((forward.x - 45f32.to_radians().sin()).abs() < 1e-5);
        assert!((forward.z - 45f32.to_radians().cos()).abs() < 1e-5);
    }

    #[test]
    fn test_create_camera_validation() {
        let router = ControlRouter::with_default_routes();
        let mut ctx = scene();

        let cases = [
            ("/create-camera?name=Cam2&x=1&y=2", "Missing parameters: name, x, y, or z."),
            ("/create-camera?name=&x=1&y=2&z=3", "Missing parameters: name, x, y, or z."),
            ("/create-camera?name=Cam2&x=1&y=two&z=3", "Invalid coordinate values."),
            (
                "/create-camera?name=MAINCAMERA&x=1&y=2&z=3",
                "Camera with name 'MAINCAMERA' already exists.",
            ),
        ];

        for (uri, expected) in cases {
            assert_eq!(get(&router, &mut ctx, uri).body, expected, "{}", uri);
        }
        assert_eq!(ctx.directory().len(), 1);
    }

    #[tokio::test]
    async fn test_create_camera_deferred() {
        LocalSet::new()
            .run_until(async {
                let router = ControlRouter::with_default_routes();
                let mut ctx = scene();

                let uri: axum::http::Uri = "/create-camera?name=Cam2&x=1&y=2&z=3".parse().unwrap();
                let response = router.dispatch(&ControlRequest::from_uri(&uri), &mut ctx);

                assert_eq!(response.body, "Creating camera 'Cam2' at (1, 2, 3)...");
                assert!(!ctx.directory().exists("Cam2"));

                ctx.run_deferred();

                let cam = ctx.directory().get("Cam2").unwrap();
                assert_eq!(cam.transform.position, Vec3::new(1.0, 2.0, 3.0));
                assert_eq!(ctx.sessions().state("Cam2"), Some(PublishState::CaptureBound));

                let again = get(&router, &mut ctx, "/create-camera?name=cam2&x=1&y=2&z=3");
                assert_eq!(again.body, "Camera with name 'cam2' already exists.");
                assert_eq!(ctx.directory().list(), vec!["MainCamera".to_string(), "Cam2".to_string()]);
            })
            .await;
    }

    #[test]
    fn test_custom_route() {
        fn count(_req: &ControlRequest, ctx: &mut SceneContext) -> String {
            ctx.directory().len().to_string()
        }

        let router = ControlRouter::new().route("/Count", count);
        let mut ctx = scene();

        assert_eq!(get(&router, &mut ctx, "/count").body, "1");
        assert_eq!(get(&router, &mut ctx, "/").status, StatusCode::NOT_FOUND);
    }
}
