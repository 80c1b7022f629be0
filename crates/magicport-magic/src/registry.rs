use std::path::Path;

use crate::engine::{Engine, Input, View, ViewKind};
use crate::error::{EngineError, RegistryError};

type Result<T> = std::result::Result<T, RegistryError>;

/// Lifecycle state of a single view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Unopened,
    Opened,
    Loaded,
}

/// One label per view, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub mime_type: String,
    pub mime_encoding: String,
    pub type_name: String,
}

struct Slot<V> {
    view: V,
    loaded: bool,
}

struct Views<V> {
    mime_type: Slot<V>,
    mime_encoding: Slot<V>,
    type_name: Slot<V>,
}

impl<V> Views<V> {
    fn get(&self, kind: ViewKind) -> &Slot<V> {
        match kind {
            ViewKind::MimeType => &self.mime_type,
            ViewKind::MimeEncoding => &self.mime_encoding,
            ViewKind::TypeName => &self.type_name,
        }
    }

    fn get_mut(&mut self, kind: ViewKind) -> &mut Slot<V> {
        match kind {
            ViewKind::MimeType => &mut self.mime_type,
            ViewKind::MimeEncoding => &mut self.mime_encoding,
            ViewKind::TypeName => &mut self.type_name,
        }
    }
}

/// Owns the three classifier views and the readiness flag.
///
/// Ready means all three views hold the same successfully loaded database.
/// The registry is either fully open or fully closed; a failed open never
/// leaves a subset of views behind.
pub struct ClassifierRegistry<E: Engine> {
    engine: E,
    views: Option<Views<E::View>>,
    ready: bool,
}

impl<E: Engine> ClassifierRegistry<E> {
    /// Create a registry with no open views.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            views: None,
            ready: false,
        }
    }

    /// Close any open views and open all three afresh, unloaded.
    pub fn open_all(&mut self) -> Result<()> {
        self.close_all();

        // Opened views are dropped (closed) again if a later one fails.
        let mime_encoding = self.open_view(ViewKind::MimeEncoding)?;
        let mime_type = self.open_view(ViewKind::MimeType)?;
        let type_name = self.open_view(ViewKind::TypeName)?;

        self.views = Some(Views {
            mime_type,
            mime_encoding,
            type_name,
        });
        tracing::debug!("classifier views opened");
        Ok(())
    }

    /// Close all views and clear readiness.
    pub fn close_all(&mut self) {
        self.ready = false;
        if self.views.take().is_some() {
            tracing::debug!("classifier views closed");
        }
    }

    /// Load the same database into every view, stopping at the first failure.
    ///
    /// Readiness is cleared first and only restored when all three loads
    /// succeed. Views are never closed on failure, so the caller may retry.
    pub fn load_all(&mut self, database: Option<&Path>) -> Result<()> {
        self.ready = false;
        let views = self.views.as_mut().ok_or(RegistryError::NotOpen)?;

        for kind in ViewKind::LOAD_ORDER {
            let slot = views.get_mut(kind);
            slot.loaded = false;
            slot.view
                .load(database)
                .map_err(|source| RegistryError::Load { view: kind, source })?;
            slot.loaded = true;
        }

        self.ready = true;
        tracing::debug!(
            database = %database.map_or("<default>".into(), |p| p.display().to_string()),
            "magic database loaded"
        );
        Ok(())
    }

    /// Classify with every view in wire order.
    ///
    /// The first view that fails short-circuits the remaining ones.
    pub fn classify(&mut self, input: Input<'_>) -> Result<Labels> {
        if !self.ready {
            return Err(RegistryError::NotReady);
        }
        let views = self.views.as_mut().ok_or(RegistryError::NotReady)?;

        let mut labels = [String::new(), String::new(), String::new()];
        for (label, kind) in labels.iter_mut().zip(ViewKind::CLASSIFY_ORDER) {
            *label = views
                .get_mut(kind)
                .view
                .classify(input)
                .map_err(|source| RegistryError::Classify { view: kind, source })?;
        }

        let [mime_type, mime_encoding, type_name] = labels;
        Ok(Labels {
            mime_type,
            mime_encoding,
            type_name,
        })
    }

    /// True when all views have a database loaded.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Current lifecycle state of one view.
    pub fn state(&self, kind: ViewKind) -> ViewState {
        match &self.views {
            None => ViewState::Unopened,
            Some(views) if views.get(kind).loaded => ViewState::Loaded,
            Some(_) => ViewState::Opened,
        }
    }

    fn open_view(&self, kind: ViewKind) -> Result<Slot<E::View>> {
        let view = self
            .engine
            .open(kind)
            .map_err(|source: EngineError| RegistryError::Open { view: kind, source })?;
        Ok(Slot {
            view,
            loaded: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Default)]
    struct Journal {
        events: Vec<String>,
        fail_open: Option<ViewKind>,
        fail_load: Option<ViewKind>,
        fail_classify: Option<ViewKind>,
    }

    #[derive(Clone, Default)]
    struct FakeEngine(Rc<RefCell<Journal>>);

    struct FakeView {
        kind: ViewKind,
        journal: Rc<RefCell<Journal>>,
    }

    impl Engine for FakeEngine {
        type View = FakeView;

        fn open(&self, kind: ViewKind) -> std::result::Result<FakeView, EngineError> {
            let mut journal = self.0.borrow_mut();
            if journal.fail_open == Some(kind) {
                return Err(EngineError::new(12, "cannot allocate memory"));
            }
            journal.events.push(format!("open {kind}"));
            Ok(FakeView {
                kind,
                journal: Rc::clone(&self.0),
            })
        }
    }

    impl View for FakeView {
        fn load(&mut self, _database: Option<&Path>) -> std::result::Result<(), EngineError> {
            let mut journal = self.journal.borrow_mut();
            journal.events.push(format!("load {}", self.kind));
            if journal.fail_load == Some(self.kind) {
                return Err(EngineError::new(2, "no such file"));
            }
            Ok(())
        }

        fn classify(&mut self, _input: Input<'_>) -> std::result::Result<String, EngineError> {
            let mut journal = self.journal.borrow_mut();
            journal.events.push(format!("classify {}", self.kind));
            if journal.fail_classify == Some(self.kind) {
                return Err(EngineError::new(13, "permission denied"));
            }
            Ok(format!("label-{}", self.kind))
        }
    }

    impl Drop for FakeView {
        fn drop(&mut self) {
            self.journal
                .borrow_mut()
                .events
                .push(format!("close {}", self.kind));
        }
    }

    fn events(engine: &FakeEngine) -> Vec<String> {
        std::mem::take(&mut engine.0.borrow_mut().events)
    }

    #[test]
    fn starts_unopened_and_not_ready() {
        let registry = ClassifierRegistry::new(FakeEngine::default());
        assert!(!registry.is_ready());
        for kind in ViewKind::CLASSIFY_ORDER {
            assert_eq!(registry.state(kind), ViewState::Unopened);
        }
    }

    #[test]
    fn open_all_opens_in_fixed_order() {
        let engine = FakeEngine::default();
        let mut registry = ClassifierRegistry::new(engine.clone());

        registry.open_all().unwrap();

        assert_eq!(
            events(&engine),
            ["open mime_encoding", "open mime_type", "open type_name"]
        );
        assert_eq!(registry.state(ViewKind::TypeName), ViewState::Opened);
        assert!(!registry.is_ready());
    }

    #[test]
    fn reopen_closes_previous_views_and_clears_readiness() {
        let engine = FakeEngine::default();
        let mut registry = ClassifierRegistry::new(engine.clone());
        registry.open_all().unwrap();
        registry.load_all(None).unwrap();
        events(&engine);

        registry.open_all().unwrap();

        let log = events(&engine);
        assert_eq!(&log[..3], ["close mime_type", "close mime_encoding", "close type_name"]);
        assert!(!registry.is_ready());
        assert_eq!(registry.state(ViewKind::MimeType), ViewState::Opened);
    }

    #[test]
    fn failed_open_leaves_no_views() {
        let engine = FakeEngine::default();
        engine.0.borrow_mut().fail_open = Some(ViewKind::TypeName);
        let mut registry = ClassifierRegistry::new(engine.clone());

        let err = registry.open_all().unwrap_err();

        assert!(matches!(
            err,
            RegistryError::Open {
                view: ViewKind::TypeName,
                ..
            }
        ));
        for kind in ViewKind::CLASSIFY_ORDER {
            assert_eq!(registry.state(kind), ViewState::Unopened);
        }
        let log = events(&engine);
        assert!(log.contains(&"close mime_encoding".to_string()));
        assert!(log.contains(&"close mime_type".to_string()));
    }

    #[test]
    fn load_all_loads_in_fixed_order_and_marks_ready() {
        let engine = FakeEngine::default();
        let mut registry = ClassifierRegistry::new(engine.clone());
        registry.open_all().unwrap();
        events(&engine);

        registry.load_all(Some(Path::new("/tmp/magic.mgc"))).unwrap();

        assert_eq!(
            events(&engine),
            ["load mime_encoding", "load mime_type", "load type_name"]
        );
        assert!(registry.is_ready());
        for kind in ViewKind::CLASSIFY_ORDER {
            assert_eq!(registry.state(kind), ViewState::Loaded);
        }
    }

    #[test]
    fn load_failure_stops_early_and_stays_retryable() {
        let engine = FakeEngine::default();
        engine.0.borrow_mut().fail_load = Some(ViewKind::MimeType);
        let mut registry = ClassifierRegistry::new(engine.clone());
        registry.open_all().unwrap();
        events(&engine);

        let err = registry.load_all(None).unwrap_err();

        assert!(matches!(
            err,
            RegistryError::Load {
                view: ViewKind::MimeType,
                ..
            }
        ));
        assert_eq!(events(&engine), ["load mime_encoding", "load mime_type"]);
        assert!(!registry.is_ready());
        assert_eq!(registry.state(ViewKind::MimeEncoding), ViewState::Loaded);
        assert_eq!(registry.state(ViewKind::MimeType), ViewState::Opened);
        assert_eq!(registry.state(ViewKind::TypeName), ViewState::Opened);

        engine.0.borrow_mut().fail_load = None;
        registry.load_all(None).unwrap();
        assert!(registry.is_ready());
    }

    #[test]
    fn failed_reload_of_database_clears_readiness() {
        let engine = FakeEngine::default();
        let mut registry = ClassifierRegistry::new(engine.clone());
        registry.open_all().unwrap();
        registry.load_all(None).unwrap();

        engine.0.borrow_mut().fail_load = Some(ViewKind::TypeName);
        assert!(registry.load_all(Some(Path::new("/nope"))).is_err());
        assert!(!registry.is_ready());
        assert_eq!(
            registry.classify(Input::Bytes(b"x")),
            Err(RegistryError::NotReady)
        );
    }

    #[test]
    fn load_before_open_is_rejected() {
        let mut registry = ClassifierRegistry::new(FakeEngine::default());
        assert_eq!(registry.load_all(None), Err(RegistryError::NotOpen));
    }

    #[test]
    fn classify_requires_ready() {
        let mut registry = ClassifierRegistry::new(FakeEngine::default());
        registry.open_all().unwrap();
        assert_eq!(
            registry.classify(Input::Path(Path::new("/etc/hosts"))),
            Err(RegistryError::NotReady)
        );
    }

    #[test]
    fn classify_returns_labels_in_wire_order() {
        let engine = FakeEngine::default();
        let mut registry = ClassifierRegistry::new(engine.clone());
        registry.open_all().unwrap();
        registry.load_all(None).unwrap();
        events(&engine);

        let labels = registry.classify(Input::Bytes(b"hello")).unwrap();

        assert_eq!(
            labels,
            Labels {
                mime_type: "label-mime_type".into(),
                mime_encoding: "label-mime_encoding".into(),
                type_name: "label-type_name".into(),
            }
        );
        assert_eq!(
            events(&engine),
            [
                "classify mime_type",
                "classify mime_encoding",
                "classify type_name"
            ]
        );
    }

    #[test]
    fn classify_failure_short_circuits() {
        let engine = FakeEngine::default();
        engine.0.borrow_mut().fail_classify = Some(ViewKind::MimeEncoding);
        let mut registry = ClassifierRegistry::new(engine.clone());
        registry.open_all().unwrap();
        registry.load_all(None).unwrap();
        events(&engine);

        let err = registry.classify(Input::Bytes(b"hello")).unwrap_err();

        assert_eq!(
            err,
            RegistryError::Classify {
                view: ViewKind::MimeEncoding,
                source: EngineError::new(13, "permission denied"),
            }
        );
        assert_eq!(
            events(&engine),
            ["classify mime_type", "classify mime_encoding"]
        );
        assert!(registry.is_ready());
    }

    #[test]
    fn close_all_drops_views() {
        let engine = FakeEngine::default();
        let mut registry = ClassifierRegistry::new(engine.clone());
        registry.open_all().unwrap();
        events(&engine);

        registry.close_all();

        assert_eq!(events(&engine).len(), 3);
        assert_eq!(registry.state(ViewKind::MimeType), ViewState::Unopened);
    }
}
