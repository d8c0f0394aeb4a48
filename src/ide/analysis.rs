//! Document state: immutable snapshots behind one lock per document.
//!
//! ```text
//! AnalysisHost ──▶ Document ──RwLock──▶ Arc<DocumentSnapshot>
//!                                         text, LineIndex, XsTree,
//!                                         EvaluatedProject?, ObjectLocator?
//! ```
//!
//! Writers build a complete snapshot and swap it in under the write lock.
//! Readers clone the `Arc` and release the lock before doing any work, so a
//! query never holds the lock across the tree walk and never sees a half
//! built snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use parking_lot::RwLock;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::location::{self, AttributeCompletion, ElementCompletion, ListItemLocation, XmlLocation};
use crate::base::{FileId, LineIndex, Position, PositionError, Range, TextSize};
use crate::expr::ExpressionNode;
use crate::hir::{
    Diagnostic, DiagnosticCollector, EvaluatedProject, EvaluationEngine, FileSet,
    LocatedObject, ObjectLocator, StaticEvaluator,
};
use crate::project::{EvaluationPolicy, SchemaHelp, Settings};
use crate::syntax::{SyntaxError, XsPath, XsTree};

/// Document version as sent by the editor.
pub type Version = i32;

/// [`DocumentSnapshot::find_object_at`] has no locator to ask.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("object locator unavailable: {reason}")]
pub struct LocatorUnavailable {
    pub reason: Arc<str>,
}

impl LocatorUnavailable {
    fn new(reason: impl Into<Arc<str>>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("query cancelled")]
    Cancelled,
    #[error("expected document version {expected}, found {actual}")]
    VersionMismatch { expected: Version, actual: Version },
    #[error(transparent)]
    Position(#[from] PositionError),
    #[error(transparent)]
    LocatorUnavailable(#[from] LocatorUnavailable),
}

/// What a load or update did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Syntax errors of the published snapshot, shared with its tree.
    pub syntax_errors: Arc<[SyntaxError]>,
    /// The published snapshot's evaluation is older than its text.
    pub is_evaluation_stale: bool,
    /// `false` when the update was ignored as out of date.
    pub applied: bool,
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// One version of a document, fully analysed. Never mutated.
#[derive(Debug)]
pub struct DocumentSnapshot {
    file: FileId,
    path: PathBuf,
    version: Version,
    text: Arc<str>,
    line_index: LineIndex,
    tree: XsTree,
    project: Option<Arc<EvaluatedProject>>,
    locator: Result<Arc<ObjectLocator>, LocatorUnavailable>,
    diagnostics: Vec<Diagnostic>,
    is_evaluation_stale: bool,
}

/// Inputs of a snapshot build that outlive a single version.
struct Evaluation<'a> {
    engine: &'a dyn EvaluationEngine,
    settings: &'a Settings,
}

impl DocumentSnapshot {
    fn build(
        file: FileId,
        path: &Path,
        text: Arc<str>,
        version: Version,
        evaluation: Option<Evaluation<'_>>,
        previous: Option<&DocumentSnapshot>,
    ) -> Self {
        let tree = XsTree::parse(&text);
        let line_index = LineIndex::new(&text);
        let mut collector = DiagnosticCollector::new(file, &line_index);
        for error in tree.errors() {
            collector.syntax_error(error);
        }

        let (project, locator, is_evaluation_stale) = match evaluation {
            None => (
                previous.and_then(|p| p.project.clone()),
                Err(LocatorUnavailable::new("evaluation is pending until the document is saved")),
                true,
            ),
            Some(_) if !tree.is_valid() => (
                None,
                Err(LocatorUnavailable::new("the document is not well-formed XML")),
                false,
            ),
            Some(Evaluation { engine, settings }) => {
                match engine.evaluate(path, &text, &settings.global_properties) {
                    Ok(project) => {
                        let locator = ObjectLocator::build(&project, &tree, &line_index);
                        (Some(Arc::new(project)), Ok(Arc::new(locator)), false)
                    }
                    Err(error) => {
                        warn!(file = %path.display(), %error, "evaluation failed");
                        collector.evaluation_error(&error);
                        (
                            None,
                            Err(LocatorUnavailable::new(format!("evaluation failed: {error}"))),
                            false,
                        )
                    }
                }
            }
        };
        let diagnostics = collector.finish();

        Self {
            file,
            path: path.to_owned(),
            version,
            text,
            line_index,
            tree,
            project,
            locator,
            diagnostics,
            is_evaluation_stale,
        }
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn tree(&self) -> &XsTree {
        &self.tree
    }

    /// Latest evaluation; under the on-save policy it may predate the text.
    pub fn project(&self) -> Option<&Arc<EvaluatedProject>> {
        self.project.as_ref()
    }

    pub fn locator(&self) -> Result<&ObjectLocator, LocatorUnavailable> {
        self.locator.as_deref().map_err(Clone::clone)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_evaluation_stale(&self) -> bool {
        self.is_evaluation_stale
    }

    pub fn offset(&self, position: Position) -> Result<TextSize, PositionError> {
        self.line_index.offset(position)
    }

    pub fn inspect(&self, position: Position) -> Result<XmlLocation, PositionError> {
        Ok(self.inspect_offset(self.offset(position)?))
    }

    pub fn inspect_offset(&self, offset: TextSize) -> XmlLocation {
        location::inspect(&self.tree, offset)
    }

    pub fn can_complete_element(
        &self,
        position: Position,
        parent_path: Option<&XsPath>,
    ) -> Result<Option<ElementCompletion>, PositionError> {
        Ok(self.inspect(position)?.can_complete_element(parent_path))
    }

    pub fn can_complete_attribute(
        &self,
        position: Position,
        element_path: Option<&XsPath>,
    ) -> Result<Option<AttributeCompletion>, PositionError> {
        Ok(self.inspect(position)?.can_complete_attribute(element_path))
    }

    /// The deepest expression node at `position` and its range.
    pub fn is_expression(
        &self,
        position: Position,
    ) -> Result<Option<(ExpressionNode, Range)>, PositionError> {
        let location = self.inspect(position)?;
        Ok(location
            .expression()
            .map(|e| (e.node().clone(), self.line_index.range(e.range()))))
    }

    /// The object declared by the innermost element containing `position`.
    ///
    /// A position outside the document declares nothing.
    pub fn find_object_at(
        &self,
        position: Position,
    ) -> Result<Option<&LocatedObject>, LocatorUnavailable> {
        let locator = self.locator()?;
        Ok(self
            .offset(position)
            .ok()
            .and_then(|offset| locator.find(offset)))
    }

    pub fn find_list_item_at(
        &self,
        position: Position,
    ) -> Result<Option<ListItemLocation>, PositionError> {
        Ok(self.inspect(position)?.list_item())
    }
}

// ============================================================================
// DOCUMENT
// ============================================================================

/// One open document.
pub struct Document {
    file: FileId,
    path: PathBuf,
    engine: Arc<dyn EvaluationEngine>,
    settings: Arc<Settings>,
    snapshot: RwLock<Arc<DocumentSnapshot>>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("file", &self.file)
            .field("path", &self.path)
            .field("version", &self.snapshot.read().version)
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Open and evaluate a document regardless of the evaluation policy.
    pub fn open(
        file: FileId,
        path: impl Into<PathBuf>,
        text: &str,
        version: Version,
        engine: Arc<dyn EvaluationEngine>,
        settings: Arc<Settings>,
    ) -> Self {
        let path = path.into();
        let snapshot = DocumentSnapshot::build(
            file,
            &path,
            text.into(),
            version,
            Some(Evaluation {
                engine: engine.as_ref(),
                settings: &settings,
            }),
            None,
        );
        debug!(
            file = %path.display(),
            version,
            errors = snapshot.diagnostics.len(),
            "opened document"
        );
        Self {
            file,
            path,
            engine,
            settings,
            snapshot: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current snapshot. The lock is held only to clone the `Arc`.
    pub fn snapshot(&self) -> Arc<DocumentSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn version(&self) -> Version {
        self.snapshot.read().version
    }

    /// Replace the text. Versions must increase; anything else is ignored.
    #[instrument(skip_all, fields(file = %self.path.display(), version = version))]
    pub fn load_or_update(&self, text: &str, version: Version) -> LoadOutcome {
        let evaluate = self.settings.evaluation == EvaluationPolicy::OnEveryChange;
        self.rebuild(Some(text), version, evaluate)
    }

    /// Re-evaluate the current text if its evaluation is stale.
    #[instrument(skip_all, fields(file = %self.path.display()))]
    pub fn save(&self) -> LoadOutcome {
        let version = self.version();
        self.rebuild(None, version, true)
    }

    fn rebuild(&self, text: Option<&str>, version: Version, evaluate: bool) -> LoadOutcome {
        let started = Instant::now();
        let mut guard = self.snapshot.write();
        let current = guard.clone();

        let text: Arc<str> = match text {
            Some(_) if version <= current.version => {
                warn!(current = current.version, "ignoring out-of-date update");
                return outcome(&current, false);
            }
            Some(text) => text.into(),
            None if !current.is_evaluation_stale => return outcome(&current, false),
            None => current.text.clone(),
        };

        let evaluation = evaluate.then(|| Evaluation {
            engine: self.engine.as_ref(),
            settings: &self.settings,
        });
        let snapshot = DocumentSnapshot::build(
            self.file,
            &self.path,
            text,
            version,
            evaluation,
            Some(&current),
        );
        let result = outcome(&snapshot, true);
        *guard = Arc::new(snapshot);
        drop(guard);

        debug!(
            errors = result.syntax_errors.len(),
            stale = result.is_evaluation_stale,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "published snapshot"
        );
        result
    }

    /// Run `query` on the current snapshot.
    ///
    /// Fails if `cancel` fired before the query started or if the snapshot
    /// is not `expected` (when given).
    pub fn read<T>(
        &self,
        cancel: &CancellationToken,
        expected: Option<Version>,
        query: impl FnOnce(&DocumentSnapshot) -> Result<T, QueryError>,
    ) -> Result<T, QueryError> {
        if cancel.is_cancelled() {
            return Err(QueryError::Cancelled);
        }
        let snapshot = self.snapshot();
        match expected {
            Some(expected) if expected != snapshot.version => {
                return Err(QueryError::VersionMismatch {
                    expected,
                    actual: snapshot.version,
                });
            }
            _ => {}
        }
        query(&snapshot)
    }

    pub fn inspect(
        &self,
        cancel: &CancellationToken,
        expected: Option<Version>,
        position: Position,
    ) -> Result<XmlLocation, QueryError> {
        self.read(cancel, expected, |s| Ok(s.inspect(position)?))
    }

    pub fn can_complete_element(
        &self,
        cancel: &CancellationToken,
        expected: Option<Version>,
        position: Position,
        parent_path: Option<&XsPath>,
    ) -> Result<Option<ElementCompletion>, QueryError> {
        self.read(cancel, expected, |s| {
            Ok(s.can_complete_element(position, parent_path)?)
        })
    }

    pub fn can_complete_attribute(
        &self,
        cancel: &CancellationToken,
        expected: Option<Version>,
        position: Position,
        element_path: Option<&XsPath>,
    ) -> Result<Option<AttributeCompletion>, QueryError> {
        self.read(cancel, expected, |s| {
            Ok(s.can_complete_attribute(position, element_path)?)
        })
    }

    pub fn is_expression(
        &self,
        cancel: &CancellationToken,
        expected: Option<Version>,
        position: Position,
    ) -> Result<Option<(ExpressionNode, Range)>, QueryError> {
        self.read(cancel, expected, |s| {
            let location = s.inspect(position)?;
            if cancel.is_cancelled() {
                return Err(QueryError::Cancelled);
            }
            Ok(location
                .expression()
                .map(|e| (e.node().clone(), s.line_index.range(e.range()))))
        })
    }

    pub fn find_object_at(
        &self,
        cancel: &CancellationToken,
        expected: Option<Version>,
        position: Position,
    ) -> Result<Option<LocatedObject>, QueryError> {
        self.read(cancel, expected, |s| {
            Ok(s.find_object_at(position)?.cloned())
        })
    }

    pub fn find_list_item_at(
        &self,
        cancel: &CancellationToken,
        expected: Option<Version>,
        position: Position,
    ) -> Result<Option<ListItemLocation>, QueryError> {
        self.read(cancel, expected, |s| {
            let location = s.inspect(position)?;
            if cancel.is_cancelled() {
                return Err(QueryError::Cancelled);
            }
            Ok(location.list_item())
        })
    }
}

fn outcome(snapshot: &DocumentSnapshot, applied: bool) -> LoadOutcome {
    LoadOutcome {
        syntax_errors: snapshot.tree.shared_errors(),
        is_evaluation_stale: snapshot.is_evaluation_stale,
        applied,
    }
}

// ============================================================================
// HOST
// ============================================================================

/// Owns the open documents.
///
/// All methods take `&self`; documents are independent, so a malformed or
/// failing document never affects the others.
pub struct AnalysisHost {
    files: FileSet,
    documents: RwLock<IndexMap<FileId, Arc<Document>>>,
    engine: Arc<dyn EvaluationEngine>,
    settings: Arc<Settings>,
    schema: Arc<SchemaHelp>,
}

impl AnalysisHost {
    pub fn new(engine: Arc<dyn EvaluationEngine>, settings: Settings, schema: SchemaHelp) -> Self {
        Self {
            files: FileSet::new(),
            documents: RwLock::new(IndexMap::new()),
            engine,
            settings: Arc::new(settings),
            schema: Arc::new(schema),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn schema(&self) -> &SchemaHelp {
        &self.schema
    }

    pub fn file_set(&self) -> &FileSet {
        &self.files
    }

    /// Open `path`, replacing any document already open there.
    pub fn open(&self, path: impl Into<PathBuf>, text: &str, version: Version) -> (FileId, LoadOutcome) {
        let path = path.into();
        let file = self.files.file_id(&path);
        let document = Document::open(
            file,
            path,
            text,
            version,
            self.engine.clone(),
            self.settings.clone(),
        );
        let result = outcome(&document.snapshot(), true);
        self.documents.write().insert(file, Arc::new(document));
        (file, result)
    }

    /// `None` if `file` is not open.
    pub fn update(&self, file: FileId, text: &str, version: Version) -> Option<LoadOutcome> {
        Some(self.document(file)?.load_or_update(text, version))
    }

    pub fn save(&self, file: FileId) -> Option<LoadOutcome> {
        Some(self.document(file)?.save())
    }

    /// Returns whether the document was open.
    pub fn close(&self, file: FileId) -> bool {
        self.documents.write().shift_remove(&file).is_some()
    }

    pub fn document(&self, file: FileId) -> Option<Arc<Document>> {
        self.documents.read().get(&file).cloned()
    }

    pub fn snapshot(&self, file: FileId) -> Option<Arc<DocumentSnapshot>> {
        self.document(file).map(|d| d.snapshot())
    }

    /// Open documents in the order they were first opened.
    pub fn files(&self) -> Vec<FileId> {
        self.documents.read().keys().copied().collect()
    }
}

impl Default for AnalysisHost {
    fn default() -> Self {
        Self::new(
            Arc::new(StaticEvaluator::new()),
            Settings::default(),
            SchemaHelp::builtin(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::{EvaluationError, GlobalProperties};

    const PROJECT: &str = "<Project>\n  <PropertyGroup>\n    <A>1</A>\n  </PropertyGroup>\n</Project>";

    struct FailingEngine;

    impl EvaluationEngine for FailingEngine {
        fn evaluate(
            &self,
            _path: &Path,
            _text: &str,
            _globals: &GlobalProperties,
        ) -> Result<EvaluatedProject, EvaluationError> {
            Err(EvaluationError::Engine("no toolset".into()))
        }
    }

    #[test]
    fn test_open_evaluates() {
        let host = AnalysisHost::default();
        let (file, outcome) = host.open("/p.proj", PROJECT, 1);
        assert!(outcome.syntax_errors.is_empty());
        assert!(!outcome.is_evaluation_stale);

        let snapshot = host.snapshot(file).unwrap();
        assert_eq!(snapshot.version(), 1);
        let object = snapshot.find_object_at(Position::zero_based(2, 6)).unwrap();
        assert_eq!(object.and_then(|o| o.value()), Some("1"));
    }

    #[test]
    fn test_out_of_date_update_ignored() {
        let host = AnalysisHost::default();
        let (file, _) = host.open("/p.proj", PROJECT, 5);
        let outcome = host.update(file, "<Project/>", 5).unwrap();
        assert!(!outcome.applied);
        assert_eq!(host.snapshot(file).unwrap().text(), PROJECT);

        let outcome = host.update(file, "<Project/>", 6).unwrap();
        assert!(outcome.applied);
        assert_eq!(host.snapshot(file).unwrap().text(), "<Project/>");
    }

    #[test]
    fn test_invalid_xml_has_no_locator() {
        let host = AnalysisHost::default();
        let (file, outcome) = host.open("/p.proj", "<Project><A></Project>", 1);
        assert_eq!(outcome.syntax_errors.len(), 1);
        let snapshot = host.snapshot(file).unwrap();
        assert_eq!(&*outcome.syntax_errors, snapshot.tree().errors());

        assert!(snapshot.find_object_at(Position::zero_based(0, 1)).is_err());
        assert!(snapshot.project().is_none());
    }

    #[test]
    fn test_engine_failure_reported() {
        let host = AnalysisHost::new(Arc::new(FailingEngine), Settings::default(), SchemaHelp::default());
        let (file, _) = host.open("/p.proj", PROJECT, 1);
        let snapshot = host.snapshot(file).unwrap();

        let err = snapshot.find_object_at(Position::zero_based(2, 6)).unwrap_err();
        assert!(err.reason.contains("no toolset"));
        assert_eq!(snapshot.diagnostics().len(), 1);
    }

    #[test]
    fn test_on_save_policy() {
        let settings = Settings {
            evaluation: EvaluationPolicy::OnSave,
            ..Settings::default()
        };
        let host = AnalysisHost::new(Arc::new(StaticEvaluator::new()), settings, SchemaHelp::builtin());
        let (file, _) = host.open("/p.proj", PROJECT, 1);

        let edited = PROJECT.replace("<A>1</A>", "<A>2</A>");
        let outcome = host.update(file, &edited, 2).unwrap();
        assert!(outcome.is_evaluation_stale);
        let snapshot = host.snapshot(file).unwrap();
        assert!(snapshot.find_object_at(Position::zero_based(2, 6)).is_err());
        assert_eq!(snapshot.project().unwrap().property_value("A"), Some("1"));

        let outcome = host.save(file).unwrap();
        assert!(!outcome.is_evaluation_stale);
        let snapshot = host.snapshot(file).unwrap();
        assert_eq!(snapshot.version(), 2);
        assert_eq!(snapshot.project().unwrap().property_value("A"), Some("2"));
    }

    #[test]
    fn test_cancelled_and_version_checks() {
        let host = AnalysisHost::default();
        let (file, _) = host.open("/p.proj", PROJECT, 3);
        let document = host.document(file).unwrap();

        let cancel = CancellationToken::new();
        assert!(document.inspect(&cancel, Some(3), Position::zero_based(0, 1)).is_ok());
        assert_eq!(
            document.inspect(&cancel, Some(2), Position::zero_based(0, 1)).unwrap_err(),
            QueryError::VersionMismatch { expected: 2, actual: 3 }
        );

        cancel.cancel();
        assert_eq!(
            document.find_object_at(&cancel, None, Position::zero_based(0, 1)).unwrap_err(),
            QueryError::Cancelled
        );
    }

    #[test]
    fn test_close() {
        let host = AnalysisHost::default();
        let (file, _) = host.open("/p.proj", PROJECT, 1);
        assert!(host.close(file));
        assert!(!host.close(file));
        assert!(host.snapshot(file).is_none());
        assert_eq!(host.update(file, PROJECT, 2), None);

        let (again, _) = host.open("/p.proj", PROJECT, 1);
        assert_eq!(again, file);
    }
}
