//! Demo service served by `rodcall serve`.
//!
//! `App` is the root. Anyone can read [`AppInfo`]; `login` stores the user
//! in the session and hands out a [`LoggedInService`], which `loggedIn`
//! rebuilds on later calls from the session alone.

use std::sync::Arc;

use rodcall_server::{
    Args, MethodError, RegistryError, RemoteRegistry, RemoteType, Reply, SessionManager,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Name reported by `AppInfo.getName`.
pub const APP_NAME: &str = "demo";

/// Password accepted by `App.login`.
pub const DEMO_PASSWORD: &str = "rodcall";

/// Session carried by demo clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoSession {
    pub user_name: String,
}

/// A value listed by `LoggedInService.getAllValues`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestValue {
    pub id: u32,
    pub name: String,
}

pub struct App {
    session: SessionManager<DemoSession>,
}

impl App {
    pub fn new(session: SessionManager<DemoSession>) -> Self {
        Self { session }
    }

    fn login(&self, name: &str, password: &str) -> Option<LoggedInService> {
        if name.is_empty() || password != DEMO_PASSWORD {
            self.session.clear();
            return None;
        }
        info!(user = name, "login");
        self.session.set(DemoSession {
            user_name: name.to_string(),
        });
        Some(LoggedInService::new(name))
    }

    fn logged_in(&self) -> Option<LoggedInService> {
        self.session.data().map(|s| LoggedInService::new(&s.user_name))
    }
}

pub struct AppInfo;

pub struct LoggedInService {
    user_name: String,
}

impl LoggedInService {
    fn new(user_name: &str) -> Self {
        Self {
            user_name: user_name.to_string(),
        }
    }

    fn all_values(&self) -> Vec<TestValue> {
        (1..=3)
            .map(|id| TestValue {
                id,
                name: format!("{}-{}", self.user_name, id),
            })
            .collect()
    }
}

/// Root factory for a dispatcher serving the demo.
pub fn root(session: SessionManager<DemoSession>) -> Result<Arc<App>, MethodError> {
    Ok(Arc::new(App::new(session)))
}

/// Registry of the demo's remote-capable types.
pub fn registry() -> Result<RemoteRegistry, RegistryError> {
    let app = RemoteType::<App>::new("App")
        .method("getAppInfo", &[], "AppInfo", |_app: Arc<App>, _args: Args| async {
            Ok(Reply::object(Arc::new(AppInfo)))
        })
        .method(
            "login",
            &["string", "string"],
            "LoggedInService?",
            |app: Arc<App>, args: Args| async move {
                let name: String = args.get(0)?;
                let password: String = args.get(1)?;
                let service = app.login(&name, &password).map(Arc::new);
                Ok::<_, MethodError>(Reply::optional(service))
            },
        )
        .method("loggedIn", &[], "LoggedInService?", |app: Arc<App>, _args: Args| async move {
            Ok(Reply::optional(app.logged_in().map(Arc::new)))
        });

    let info = RemoteType::<AppInfo>::new("AppInfo")
        .cached("getName", "string", |_info: Arc<AppInfo>| async { Reply::value(APP_NAME) })
        .method("getVersion", &[], "string", |_info: Arc<AppInfo>, _args: Args| async {
            Reply::value(env!("CARGO_PKG_VERSION"))
        });

    let logged_in = RemoteType::<LoggedInService>::new("LoggedInService")
        .cached("getLoginName", "string", |service: Arc<LoggedInService>| async move {
            Reply::value(&service.user_name)
        })
        .method(
            "getAllValues",
            &[],
            "[TestValue]",
            |service: Arc<LoggedInService>, _args: Args| async move {
                Reply::value(&service.all_values())
            },
        );

    RemoteRegistry::builder()
        .register(app)
        .register(info)
        .register(logged_in)
        .build()
}
