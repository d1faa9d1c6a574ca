//! Typed addresses into the version tree.
//!
//! The backend only knows flat string keys. Each node kind maps to one key:
//!
//! | node        | backend key             | kind   |
//! |-------------|-------------------------|--------|
//! | root        | `apps`                  | set    |
//! | app         | `app`                   | set    |
//! | environment | `app:env`               | set    |
//! | component   | `app:env:component`     | string |
//!
//! Segments are escaped before joining (`\` → `\\`, `:` → `\:`), so a name
//! containing the separator cannot alias another node. Names free of both
//! characters produce the plain colon-joined layout.

use std::fmt;

use crate::errors::ModelError;

/// Set holding every app name.
pub const APPS_SET: &str = "apps";

const SEPARATOR: char = ':';
const ESCAPE: char = '\\';

fn escape_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if c == SEPARATOR || c == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out
}

fn join(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| escape_segment(s))
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string())
}

fn check_name(kind: &str, name: &str) -> Result<(), ModelError> {
    if name.is_empty() {
        return Err(ModelError::invalid_name(kind, name, "must not be empty"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppKey {
    app: String,
}

impl AppKey {
    pub fn new(app: impl Into<String>) -> Result<Self, ModelError> {
        let app = app.into();
        check_name("app", &app)?;
        // the app's own set would be the root set
        if app == APPS_SET {
            return Err(ModelError::invalid_name("app", &app, "reserved"));
        }
        Ok(Self { app })
    }

    pub fn name(&self) -> &str {
        &self.app
    }

    /// Set of environment names under this app.
    pub fn set_key(&self) -> String {
        join(&[&self.app])
    }

    pub fn env(&self, env: impl Into<String>) -> Result<EnvKey, ModelError> {
        let env = env.into();
        check_name("environment", &env)?;
        Ok(EnvKey { app: self.clone(), env })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvKey {
    app: AppKey,
    env: String,
}

impl EnvKey {
    pub fn new(app: impl Into<String>, env: impl Into<String>) -> Result<Self, ModelError> {
        AppKey::new(app)?.env(env)
    }

    pub fn app(&self) -> &AppKey {
        &self.app
    }

    pub fn name(&self) -> &str {
        &self.env
    }

    /// Set of component names deployed in this environment.
    pub fn set_key(&self) -> String {
        join(&[self.app.name(), &self.env])
    }

    pub fn component(&self, component: impl Into<String>) -> Result<ComponentKey, ModelError> {
        let component = component.into();
        check_name("component", &component)?;
        Ok(ComponentKey { env: self.clone(), component })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentKey {
    env: EnvKey,
    component: String,
}

impl ComponentKey {
    pub fn new(
        app: impl Into<String>,
        env: impl Into<String>,
        component: impl Into<String>,
    ) -> Result<Self, ModelError> {
        EnvKey::new(app, env)?.component(component)
    }

    pub fn env(&self) -> &EnvKey {
        &self.env
    }

    pub fn name(&self) -> &str {
        &self.component
    }

    /// String key holding the version.
    pub fn value_key(&self) -> String {
        join(&[self.env.app.name(), &self.env.env, &self.component])
    }
}

impl fmt::Display for AppKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.set_key())
    }
}

impl fmt::Display for EnvKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.set_key())
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value_key())
    }
}
