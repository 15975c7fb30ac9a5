//! Widget lifecycle and render orchestration.

use std::cell::{Cell, Ref, RefCell};
use std::future::Future;
use std::sync::Arc;

use zmd_cache::Signal;
use zmd_config::instance::MANUAL_RENDER;
use zmd_config::{Attributes, ConfigError, InstanceConfig};
use zmd_fetch::Fetcher;

use crate::content::ContentBuilder;
use crate::environment::Environment;
use crate::error::RenderError;
use crate::host::{Host, Node};
use crate::script::ScriptHost;
use crate::style::StyleAssembler;
use crate::template::Template;

/// Element name used when serializing a widget.
pub const TAG: &str = "zmd-markdown";
/// Lifecycle signal emitted once per attach.
pub const READY_SIGNAL: &str = "zmd-ready";
/// Lifecycle signal emitted once per successful render cycle.
pub const RENDERED_SIGNAL: &str = "zmd-rendered";

/// Observable render state of a widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderState {
    /// No cycle has succeeded and none is running.
    Idle,
    /// At least one cycle is in flight.
    Rendering,
    /// The last settled cycle left rendered output in place.
    Rendered,
}

/// Counts a cycle as in flight until dropped.
struct CycleGuard<'a> {
    in_flight: &'a Cell<usize>,
}

impl<'a> CycleGuard<'a> {
    fn enter(in_flight: &'a Cell<usize>) -> Self {
        in_flight.set(in_flight.get() + 1);
        Self { in_flight }
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.set(self.in_flight.get() - 1);
    }
}

/// One markdown widget instance.
///
/// Configuration lives in string [`Attributes`], snapshotted at the start of
/// every cycle. Cycles are futures borrowing the widget; callers drive them
/// on a single-threaded executor. Overlapping cycles are allowed and the
/// last one to finish determines the output.
pub struct Widget<F, S> {
    id: String,
    env: Arc<Environment<F, S>>,
    attributes: RefCell<Attributes>,
    template: Option<Template>,
    host: RefCell<Host>,
    attached: Cell<bool>,
    in_flight: Cell<usize>,
    rendered: Cell<bool>,
}

impl<F: Fetcher, S: ScriptHost> Widget<F, S> {
    /// Create a detached widget with no attributes.
    pub fn new(id: impl Into<String>, env: Arc<Environment<F, S>>) -> Self {
        Self {
            id: id.into(),
            env,
            attributes: RefCell::new(Attributes::new()),
            template: None,
            host: RefCell::new(Host::new()),
            attached: Cell::new(false),
            in_flight: Cell::new(0),
            rendered: Cell::new(false),
        }
    }

    /// Replace the widget's attributes.
    #[must_use]
    pub fn with_attributes(self, attributes: Attributes) -> Self {
        self.attributes.replace(attributes);
        self
    }

    /// Attach a template fragment. It becomes a light child of the host and
    /// its overrides apply to every cycle.
    #[must_use]
    pub fn with_template(mut self, template: Template) -> Self {
        self.host.get_mut().append(Node::new(template.to_html()));
        self.template = Some(template);
        self
    }

    /// Start a render cycle.
    ///
    /// The configuration is read before this returns; the cycle itself runs
    /// when the returned future is driven. Style and content are built
    /// concurrently and stamped together. A failed content build leaves the
    /// host untouched and emits no signal.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the attributes cannot be read into a
    /// configuration.
    pub fn render(
        &self,
    ) -> Result<impl Future<Output = Result<(), RenderError>> + '_, ConfigError> {
        let config = InstanceConfig::from_attributes(&self.attributes.borrow())?;
        let cycle = CycleGuard::enter(&self.in_flight);

        Ok(async move {
            let _cycle = cycle;
            self.run_cycle(config).await
        })
    }

    async fn run_cycle(&self, config: InstanceConfig) -> Result<(), RenderError> {
        let template = self.template.as_ref();
        let styles = StyleAssembler::new(self.env.cache(), self.env.fetcher());
        let content = ContentBuilder::new(&*self.env);

        let (style, content) = tokio::join!(
            styles.build(&config, template),
            content.build(&config, template),
        );
        let content = content.inspect_err(|err| {
            tracing::warn!(id = %self.id, error = %err, "Render failed");
        })?;

        self.host
            .borrow_mut()
            .stamp(&format!("{style}{content}"), config.no_shadow);
        self.rendered.set(true);
        tracing::debug!(id = %self.id, "Rendered");
        self.env
            .signals()
            .emit(Signal::new(RENDERED_SIGNAL).with_origin(self.id.as_str()));
        Ok(())
    }

    /// Attach hook.
    ///
    /// Starts a cycle unless `manual-render` is set, then emits the ready
    /// signal without waiting for that cycle. The cycle, if any, is returned
    /// for the caller to drive.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the automatic cycle could not start. The
    /// ready signal is emitted regardless.
    pub fn on_attach(
        &self,
    ) -> Result<Option<impl Future<Output = Result<(), RenderError>> + '_>, ConfigError> {
        self.attached.set(true);
        let cycle = self.auto_render();
        self.env
            .signals()
            .emit(Signal::new(READY_SIGNAL).with_origin(self.id.as_str()));
        cycle.transpose()
    }

    /// Attribute change hook. `None` removes the attribute.
    ///
    /// An attached widget without `manual-render` starts a fresh cycle,
    /// returned for the caller to drive.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the new configuration cannot be read.
    pub fn on_config_change(
        &self,
        name: &str,
        value: Option<&str>,
    ) -> Result<Option<impl Future<Output = Result<(), RenderError>> + '_>, ConfigError> {
        {
            let mut attributes = self.attributes.borrow_mut();
            match value {
                Some(value) => attributes.set(name, value),
                None => {
                    attributes.remove(name);
                }
            }
        }

        if !self.attached.get() {
            return Ok(None);
        }
        self.auto_render().transpose()
    }

    /// Detach hook. Cycles already started still run to completion.
    pub fn on_detach(&self) {
        self.attached.set(false);
    }

    fn auto_render(
        &self,
    ) -> Option<Result<impl Future<Output = Result<(), RenderError>> + '_, ConfigError>> {
        if self.attributes.borrow().has(MANUAL_RENDER) {
            None
        } else {
            Some(self.render())
        }
    }
}

impl<F, S> Widget<F, S> {
    /// Instance identifier, used as the origin of lifecycle signals.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current render state.
    pub fn state(&self) -> RenderState {
        if self.in_flight.get() > 0 {
            RenderState::Rendering
        } else if self.rendered.get() {
            RenderState::Rendered
        } else {
            RenderState::Idle
        }
    }

    /// The widget's host tree.
    ///
    /// # Panics
    ///
    /// Panics if called while a cycle is stamping, which cannot happen
    /// from another task on a single-threaded executor.
    pub fn host(&self) -> Ref<'_, Host> {
        self.host.borrow()
    }

    /// Serialize the widget as an element.
    pub fn to_html(&self) -> String {
        self.host.borrow().to_html(TAG, &self.attributes.borrow())
    }
}
