//! Revision history backed by a git repository via git2.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use git2::{Delta, DiffFindOptions, DiffOptions, ErrorCode, Repository, Sort, Tree};
use tracing::debug;

use crate::provider::{HistoryError, RevisionHistory, TouchedFile};

/// Git-backed [`RevisionHistory`].
///
/// The repository is discovered from the project root upwards. When the
/// project lives in a subdirectory of the repository, paths outside it are
/// dropped and the rest are reported relative to the project root, matching
/// the file index.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use docsync_history::git::GitHistory;
/// use docsync_history::provider::RevisionHistory;
///
/// let history = GitHistory::open(Path::new(".")).unwrap();
/// println!("HEAD is {}", history.current_revision().unwrap());
/// ```
pub struct GitHistory {
    repo: Repository,
    prefix: String,
}

impl GitHistory {
    /// Open the repository containing `project_root`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Unavailable`] if no repository is found or it
    /// is bare.
    pub fn open(project_root: &Path) -> Result<Self, HistoryError> {
        let repo = Repository::discover(project_root)
            .map_err(|e| HistoryError::Unavailable(format!("no git repository: {e}")))?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| HistoryError::Unavailable("bare repository".into()))?
            .to_path_buf();

        let prefix = project_prefix(&workdir, project_root);
        debug!(workdir = %workdir.display(), prefix = %prefix, "opened git history");
        Ok(Self { repo, prefix })
    }

    fn tree_of(&self, revision: &str) -> Result<Tree<'_>, HistoryError> {
        self.repo
            .revparse_single(revision)
            .and_then(|obj| obj.peel_to_tree())
            .map_err(|_| HistoryError::UnknownRevision(revision.to_string()))
    }

    /// Diff two trees into per-file line counts, keyed by project path.
    fn diff_trees(
        &self,
        old: Option<&Tree<'_>>,
        new: Option<&Tree<'_>>,
    ) -> Result<Vec<TouchedFile>, HistoryError> {
        let mut diff_opts = DiffOptions::new();
        let mut diff = self
            .repo
            .diff_tree_to_tree(old, new, Some(&mut diff_opts))
            .map_err(|e| HistoryError::Backend(format!("failed to compute diff: {e}")))?;

        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true);
        diff.find_similar(Some(&mut find_opts))
            .map_err(|e| HistoryError::Backend(format!("failed to find renames: {e}")))?;

        let mut counts: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        for delta in diff.deltas() {
            let file = match delta.status() {
                Delta::Deleted => delta.old_file(),
                _ => delta.new_file(),
            };
            if let Some(path) = file.path().and_then(|p| self.project_path(p)) {
                counts.entry(path).or_default();
            }
        }

        diff.foreach(
            &mut |_delta, _progress| true,
            None,
            None,
            Some(&mut |delta, _hunk, line| {
                let path = delta.new_file().path().or_else(|| delta.old_file().path());
                if let Some(path) = path.and_then(|p| self.project_path(p)) {
                    let entry = counts.entry(path).or_default();
                    match line.origin() {
                        '+' => entry.0 += 1,
                        '-' => entry.1 += 1,
                        _ => {}
                    }
                }
                true
            }),
        )
        .map_err(|e| HistoryError::Backend(format!("failed to iterate diff lines: {e}")))?;

        Ok(counts
            .into_iter()
            .map(|(path, (added, deleted))| TouchedFile {
                path,
                added,
                deleted,
            })
            .collect())
    }

    /// Map a repository path to a project path, or `None` if outside the project.
    fn project_path(&self, repo_path: &Path) -> Option<String> {
        let path = repo_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if self.prefix.is_empty() {
            return Some(path);
        }
        path.strip_prefix(&self.prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .map(str::to_string)
    }
}

impl RevisionHistory for GitHistory {
    fn current_revision(&self) -> Result<String, HistoryError> {
        let head = self.repo.head().map_err(|e| match e.code() {
            ErrorCode::UnbornBranch | ErrorCode::NotFound => {
                HistoryError::Unavailable("repository has no commits".into())
            }
            _ => HistoryError::Backend(format!("failed to read HEAD: {e}")),
        })?;
        let commit = head
            .peel_to_commit()
            .map_err(|e| HistoryError::Backend(format!("HEAD is not a commit: {e}")))?;
        Ok(commit.id().to_string())
    }

    fn touched_files(&self, from: &str, to: &str) -> Result<Vec<TouchedFile>, HistoryError> {
        let old = self.tree_of(from)?;
        let new = self.tree_of(to)?;
        self.diff_trees(Some(&old), Some(&new))
    }

    fn recent_changes(&self, limit: usize) -> Result<Vec<Vec<String>>, HistoryError> {
        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(|e| HistoryError::Backend(format!("failed to create revwalk: {e}")))?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME).ok();
        revwalk
            .push_head()
            .map_err(|e| HistoryError::Unavailable(format!("failed to push HEAD: {e}")))?;

        let mut out = Vec::new();
        for oid in revwalk.take(limit) {
            let oid = oid.map_err(|e| HistoryError::Backend(format!("revwalk error: {e}")))?;
            let commit = self
                .repo
                .find_commit(oid)
                .map_err(|e| HistoryError::Backend(format!("failed to find commit: {e}")))?;
            let tree = commit
                .tree()
                .map_err(|e| HistoryError::Backend(format!("failed to get commit tree: {e}")))?;
            let parent_tree = match commit.parent(0) {
                Ok(parent) => Some(parent.tree().map_err(|e| {
                    HistoryError::Backend(format!("failed to get parent tree: {e}"))
                })?),
                Err(_) => None,
            };

            let files = self.diff_trees(parent_tree.as_ref(), Some(&tree))?;
            out.push(files.into_iter().map(|f| f.path).collect());
        }
        Ok(out)
    }
}

fn project_prefix(workdir: &Path, project_root: &Path) -> String {
    let canonical = |p: &Path| p.canonicalize().unwrap_or_else(|_| PathBuf::from(p));
    let workdir = canonical(workdir);
    let root = canonical(project_root);
    root.strip_prefix(&workdir)
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}
