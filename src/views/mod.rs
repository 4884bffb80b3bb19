//! View composition and the compiled-view cache.
//!
//! A view is addressed by a [`CompositeKey`]. Every identifier resolves to
//! `<directory>/<identifier><suffix>`; all of them are compiled into one
//! template environment and the first one is rendered. The remaining names are
//! exposed to the entry template as `fragments`, so a layout can pull the page
//! in with `{% for f in fragments %}{% include f %}{% endfor %}`.
//!
//! Compiled views are cached per exact key string for the lifetime of the
//! composer. There is no eviction: keys must come from code, never from
//! request input.

pub mod context;
pub mod key;

use minijinja::{Environment, Value, value::Rest};
use serde::Serialize;
use std::{
    collections::HashMap,
    io,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};
use thiserror::Error;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, instrument};

use crate::{
    i18n::Localizer,
    session::{Session, SessionError, Sessions},
};

pub use context::{AppInfo, EmptyPage, RenderContext};
pub use key::CompositeKey;

/// URL reversal by route name.
pub type Reverse = Arc<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("empty composite template key")]
    EmptyKey,
    #[error("invalid template identifier {identifier:?} in key {key}")]
    InvalidIdentifier { key: String, identifier: String },
    #[error("template source {} for key {key} could not be read", path.display())]
    MissingSource {
        key: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("template {name} for key {key} is malformed")]
    MalformedSource {
        key: String,
        name: String,
        #[source]
        source: minijinja::Error,
    },
    #[error("failed to render view {key}")]
    Render {
        key: String,
        #[source]
        source: minijinja::Error,
    },
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ViewError {
    /// Whether the key could not be turned into a compiled view.
    #[must_use]
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Self::EmptyKey
                | Self::InvalidIdentifier { .. }
                | Self::MissingSource { .. }
                | Self::MalformedSource { .. }
        )
    }
}

#[derive(Clone, Debug)]
pub struct ViewConfig {
    directory: PathBuf,
    suffix: String,
}

impl ViewConfig {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            suffix: ".html".to_string(),
        }
    }

    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    #[must_use]
    pub fn directory(&self) -> &PathBuf {
        &self.directory
    }

    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    fn template_name(&self, identifier: &str) -> String {
        format!("{identifier}{}", self.suffix)
    }
}

/// Process-wide values injected into every render.
pub struct ViewGlobals {
    pub cdn_mode: bool,
    pub static_path: String,
    pub app_info: AppInfo,
    pub localizer: Arc<dyn Localizer>,
    pub reverse: Reverse,
}

/// A parsed, ready-to-execute view.
pub struct CompiledView {
    key: CompositeKey,
    entry: String,
    env: Environment<'static>,
}

impl CompiledView {
    #[must_use]
    pub fn key(&self) -> &CompositeKey {
        &self.key
    }

    fn render<S: Serialize>(&self, context: &S) -> Result<String, ViewError> {
        let render_error = |source| ViewError::Render {
            key: self.key.to_string(),
            source,
        };
        self.env
            .get_template(&self.entry)
            .map_err(render_error)?
            .render(context)
            .map_err(render_error)
    }
}

pub struct ViewComposer {
    config: ViewConfig,
    globals: ViewGlobals,
    sessions: Arc<Sessions>,
    cache: RwLock<HashMap<String, Arc<OnceCell<Arc<CompiledView>>>>>,
    compilations: AtomicUsize,
}

impl ViewComposer {
    pub fn new(config: ViewConfig, globals: ViewGlobals, sessions: Arc<Sessions>) -> Self {
        Self {
            config,
            globals,
            sessions,
            cache: RwLock::new(HashMap::new()),
            compilations: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Render `key` with `page` merged into the shared context.
    ///
    /// Always drains the session's flash queue (only the first message is
    /// shown) and saves the session before the view is resolved.
    ///
    /// # Errors
    /// Returns an error if the session cannot be saved, the key cannot be
    /// resolved to a compiled view, or the view fails to execute.
    #[instrument(skip(self, session, page))]
    pub async fn render<T: Serialize>(
        &self,
        session: &Session,
        key: &str,
        page: &T,
    ) -> Result<String, ViewError> {
        let flash = session.take_flashes().into_iter().next();
        self.sessions.save(session)?;

        let context = RenderContext {
            cdn_mode: self.globals.cdn_mode,
            app_info: &self.globals.app_info,
            flash,
            uid: session.identity(),
            page,
        };

        self.view(key).await?.render(&context)
    }

    /// Resolve `key` to its compiled view, compiling it on first use.
    ///
    /// Concurrent first lookups of the same key share one compilation. A
    /// failed compilation is not cached and is retried on the next lookup.
    ///
    /// # Errors
    /// Returns a resolution error if the key is invalid or a source is
    /// missing or malformed.
    pub async fn view(&self, key: &str) -> Result<Arc<CompiledView>, ViewError> {
        CompositeKey::parse(key)?;

        let cached = self.cache.read().await.get(key).cloned();
        let cell = match cached {
            Some(cell) => cell,
            None => Arc::clone(
                self.cache
                    .write()
                    .await
                    .entry(key.to_string())
                    .or_default(),
            ),
        };

        match cell.get_or_try_init(|| self.compile(key)).await {
            Ok(view) => Ok(Arc::clone(view)),
            Err(err) => {
                self.forget(key, &cell).await;
                Err(err)
            }
        }
    }

    /// Drop the slot of a failed compilation unless another lookup has
    /// replaced or filled it meanwhile.
    async fn forget(&self, key: &str, cell: &Arc<OnceCell<Arc<CompiledView>>>) {
        let mut cache = self.cache.write().await;
        if cache
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, cell) && !current.initialized())
        {
            cache.remove(key);
        }
    }

    /// Number of compilations performed so far, failed ones excluded.
    #[must_use]
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }

    /// Number of keys with a compiled view in the cache.
    pub async fn cached_views(&self) -> usize {
        self.cache
            .read()
            .await
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    #[cfg(test)]
    async fn cache_slots(&self) -> usize {
        self.cache.read().await.len()
    }

    async fn compile(&self, raw: &str) -> Result<Arc<CompiledView>, ViewError> {
        let key = CompositeKey::parse(raw)?;
        let mut env = Environment::new();

        for identifier in key.identifiers() {
            let name = self.config.template_name(identifier);
            let path = self.config.directory.join(&name);
            let source = tokio::fs::read_to_string(&path).await.map_err(|source| {
                ViewError::MissingSource {
                    key: raw.to_string(),
                    path,
                    source,
                }
            })?;
            env.add_template_owned(name.clone(), source)
                .map_err(|source| ViewError::MalformedSource {
                    key: raw.to_string(),
                    name,
                    source,
                })?;
        }

        let fragments: Vec<String> = key
            .fragments()
            .iter()
            .map(|identifier| self.config.template_name(identifier))
            .collect();
        env.add_global("fragments", Value::from(fragments));
        env.add_global(
            "static",
            Value::from_safe_string(self.globals.static_path.clone()),
        );
        self.register_functions(&mut env);

        let entry = self.config.template_name(key.entry());
        self.compilations.fetch_add(1, Ordering::Relaxed);
        debug!(key = raw, entry = %entry, "Compiled view");

        Ok(Arc::new(CompiledView { key, entry, env }))
    }

    fn register_functions(&self, env: &mut Environment<'static>) {
        let localizer = Arc::clone(&self.globals.localizer);
        env.add_function("i18n", move |key: String, args: Rest<Value>| -> String {
            let args: Vec<String> = args.iter().map(ToString::to_string).collect();
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            localizer.text(&key, &args)
        });

        let reverse = Arc::clone(&self.globals.reverse);
        env.add_function("reverse", move |name: String| -> Value {
            Value::from_safe_string(reverse(&name))
        });
    }
}
