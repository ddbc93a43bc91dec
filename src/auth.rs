use crate::config::AppConfig;

/// Single hard-wired credential pair guarding the admin views.
#[derive(Debug, Clone)]
pub struct AdminGate {
    username: String,
    password: String,
}

impl AdminGate {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(cfg.admin_username.clone(), cfg.admin_password.clone())
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        username.trim() == self.username && password == self.password
    }
}
