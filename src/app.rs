use crate::component::{Component, Connection};
use crate::config::AppConfig;
use crate::error::WireError;
use crate::introspect::AppInfo;
use crate::lifecycle::Lifecycle;
use crate::utils::wait_for_termination;
use anyhow::anyhow;
use std::sync::Arc;

/// Produces owned components by name. The embedding binary decides how
/// instances come to exist (static registry, plugin loader, test stub);
/// the runtime only needs the resulting handle.
pub trait ComponentFactory {
    fn create(&self, name: &str) -> Option<Component>;
}

impl<F> ComponentFactory for F
where
    F: Fn(&str) -> Option<Component>,
{
    fn create(&self, name: &str) -> Option<Component> {
        self(name)
    }
}

/// An ordered set of owned components driven through a common lifecycle.
pub struct Application {
    name: String,
    components: Vec<Arc<Component>>,
}

impl Application {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Take ownership of a component. Lifecycle calls hit components in
    /// registration order.
    pub fn add_component(&mut self, component: Component) -> Arc<Component> {
        let component = Arc::new(component);
        self.components.push(component.clone());
        component
    }

    pub fn components(&self) -> &[Arc<Component>] {
        &self.components
    }

    pub fn get_component(&self, id: &str) -> Option<Arc<Component>> {
        self.components.iter().find(|c| c.id() == id).cloned()
    }

    /// Release every component, stopping what runs. Used on teardown,
    /// e.g. after a wiring failure.
    pub fn clear(&mut self) {
        self.components.clear();
    }

    /// Apply a declarative edge list. Fails fast on the first bad edge
    /// so the caller can discard the whole graph rather than run it
    /// half-wired.
    pub fn apply_connections(&self, connections: &[Connection]) -> Result<(), WireError> {
        for conn in connections {
            let output = self.get_component(&conn.output.component).ok_or_else(|| {
                WireError::NoSuchComponent {
                    id: conn.output.component.clone(),
                }
            })?;
            let input = self.get_component(&conn.input.component).ok_or_else(|| {
                WireError::NoSuchComponent {
                    id: conn.input.component.clone(),
                }
            })?;
            if output.get_port(&conn.output.port).is_none() {
                return Err(WireError::NoSuchPort {
                    component: conn.output.component.clone(),
                    port: conn.output.port.clone(),
                });
            }
            if input.get_port(&conn.input.port).is_none() {
                return Err(WireError::NoSuchPort {
                    component: conn.input.component.clone(),
                    port: conn.input.port.clone(),
                });
            }
            if !output.connect(&conn.output.port, &input, &conn.input.port) {
                return Err(WireError::Rejected {
                    output_component: conn.output.component.clone(),
                    output_port: conn.output.port.clone(),
                    input_component: conn.input.component.clone(),
                    input_port: conn.input.port.clone(),
                });
            }
            tracing::debug!(
                output = %format!("{}:{}", conn.output.component, conn.output.port),
                input = %format!("{}:{}", conn.input.component, conn.input.port),
                "connected"
            );
        }
        Ok(())
    }

    /// Build a wired application from a configuration: create each
    /// component through `factory`, apply application-wide then
    /// per-component properties, and wire the edges. Any failure tears
    /// the partial graph down.
    pub fn assemble(config: &AppConfig, factory: &dyn ComponentFactory) -> anyhow::Result<Self> {
        let mut app = Application::new(&config.name);
        for comp_cfg in &config.components {
            let component = factory
                .create(&comp_cfg.name)
                .ok_or_else(|| anyhow!("no factory for component {:?}", comp_cfg.name))?;
            if let Some(id) = &comp_cfg.id {
                component.set_id(id);
            }
            for spec in &config.properties {
                component.set_property_value(&spec.name, spec.to_value()?);
            }
            for spec in &comp_cfg.properties {
                component.set_property_value(&spec.name, spec.to_value()?);
            }
            app.add_component(component);
        }
        if let Err(err) = app.apply_connections(&config.connections) {
            app.clear();
            return Err(err.into());
        }
        Ok(app)
    }

    pub fn describe(&self) -> AppInfo {
        let components: Vec<_> = self.components.iter().map(|c| c.describe()).collect();
        let connections = components
            .iter()
            .flat_map(|c| c.connections.iter().cloned())
            .collect();
        AppInfo {
            name: self.name.clone(),
            components,
            connections,
        }
    }

    /// Convenience for binary hosts: bring the graph up, park until
    /// SIGINT/SIGTERM, then stop it.
    pub fn run_until_signal(&self) {
        self.initialize();
        self.start();
        wait_for_termination();
        self.stop();
    }
}

impl Lifecycle for Application {
    fn initialize(&self) {
        for component in &self.components {
            component.initialize();
        }
    }

    fn start(&self) {
        tracing::info!(app = %self.name, components = self.components.len(), "starting");
        for component in &self.components {
            component.start();
        }
    }

    fn stop(&self) {
        tracing::info!(app = %self.name, "stopping");
        for component in &self.components {
            component.stop();
        }
    }
}
