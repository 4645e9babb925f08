//! Block manifest builder.
//!
//! Walks one or more block directories laid out as `<root>/<category>/<block>`
//! and produces the [`Category`] list published as `blockpm-manifest.json`.
//!
//! ```text
//! blocks/
//! ├── utils/
//! │   ├── gcf.ts            → utils/gcf      (single-file block)
//! │   ├── gcf.test.ts       ↳ test file of utils/gcf
//! │   └── math/             → utils/math     (multi-file block)
//! │       ├── index.ts
//! │       └── add.ts
//! └── format/
//!     └── print.ts          → format/print
//! ```
//!
//! Every non-test file of a block is extracted, classified and pinned; the
//! results are merged into sorted, de-duplicated sets. Nothing is written here:
//! a failure in any file fails the whole build and no manifest is produced.
//!
//! # Filters
//!
//! Include and exclude filters decide which blocks are published. A block that
//! an admitted block depends on (directly or transitively) is published anyway,
//! with `list = false`, so that installs never dangle. `do_not_list_*` filters
//! only hide blocks from listings.

pub mod filters;

pub use filters::BlockFilters;

use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::classify::{AliasMatcher, Classification, classify};
use crate::core::BlockpmError;
use crate::extract::{Dialect, extract};
use crate::pinning::{ManifestLookup, PinnedDependencies, pin};
use crate::registry::{Block, Category, block_id};
use crate::utils::fs::{normalize_path, relative_path, to_forward_slashes};

/// Options controlling a manifest build.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Only publish blocks matching these patterns
    pub include_blocks: Vec<String>,
    /// Only publish categories matching these patterns
    pub include_categories: Vec<String>,
    /// Never publish blocks matching these patterns (unless depended upon)
    pub exclude_blocks: Vec<String>,
    /// Never publish categories matching these patterns (unless depended upon)
    pub exclude_categories: Vec<String>,
    /// Publish but hide from listings
    pub do_not_list_blocks: Vec<String>,
    /// Publish but hide from listings
    pub do_not_list_categories: Vec<String>,
    /// Package names never recorded as dependencies
    pub exclude_deps: Vec<String>,
    /// Fail instead of warning on unsupported layouts
    pub strict: bool,
    /// Directory above which `package.json` and `tsconfig.json` are not searched
    pub search_boundary: Option<PathBuf>,
    /// Directory that block `directory` fields are relative to.
    /// Defaults to the block root the block was found in.
    pub manifest_root: Option<PathBuf>,
}

/// A block found on disk, before its files are scanned.
#[derive(Debug, Clone)]
struct Candidate {
    category: String,
    name: String,
    root: PathBuf,
    dir: PathBuf,
    subdirectory: bool,
    files: Vec<String>,
    tests: bool,
}

impl Candidate {
    fn id(&self) -> String {
        block_id(&self.category, &self.name)
    }
}

/// Builds the categories of all blocks found under `tree_roots`.
///
/// # Errors
///
/// - [`BlockpmError::ParseError`] when a block file cannot be parsed
/// - [`BlockpmError::UnresolvableReference`] when a reference leaves every tree root
/// - [`BlockpmError::DuplicateBlock`] when two blocks share `<category>/<name>`
/// - [`BlockpmError::UnsupportedLayout`] for nested directories under `strict`
pub fn build(tree_roots: &[PathBuf], options: &BuildOptions) -> Result<Vec<Category>> {
    let roots: Vec<PathBuf> = tree_roots.iter().map(|r| normalize_path(r)).collect();
    let filters = BlockFilters::new(options)?;

    let mut candidates: BTreeMap<String, Candidate> = BTreeMap::new();
    for root in &roots {
        for candidate in discover_blocks(root, options.strict)? {
            let id = candidate.id();
            if let Some(existing) = candidates.get(&id) {
                return Err(BlockpmError::DuplicateBlock {
                    id,
                    first: to_forward_slashes(&existing.dir),
                    second: to_forward_slashes(&candidate.dir),
                }
                .into());
            }
            candidates.insert(id, candidate);
        }
    }
    tracing::info!("Found {} blocks in {} block directories", candidates.len(), roots.len());

    let mut scanner = Scanner::new(&roots, options)?;
    let mut built: BTreeMap<String, Block> = BTreeMap::new();
    let mut pending: VecDeque<(String, bool)> = VecDeque::new();

    for (id, candidate) in &candidates {
        if filters.admits(&candidate.category, &candidate.name) {
            pending.push_back((id.clone(), filters.listed(&candidate.category, &candidate.name)));
        } else {
            tracing::debug!("Block {} excluded by filters", id);
        }
    }

    while let Some((id, list)) = pending.pop_front() {
        if built.contains_key(&id) {
            continue;
        }
        let Some(candidate) = candidates.get(&id) else {
            continue;
        };

        let block = scanner.scan(candidate, list)?;
        for dependency in &block.local_dependencies {
            if built.contains_key(dependency) {
                continue;
            }
            if candidates.contains_key(dependency) {
                if !pending.iter().any(|(queued, _)| queued == dependency) {
                    tracing::debug!("Including {} as a dependency of {}", dependency, id);
                    pending.push_back((dependency.clone(), false));
                }
            } else {
                tracing::warn!("Block {} depends on {}, which does not exist", id, dependency);
            }
        }
        built.insert(id, block);
    }

    let mut categories: BTreeMap<String, Vec<Block>> = BTreeMap::new();
    for block in built.into_values() {
        categories.entry(block.category.clone()).or_default().push(block);
    }

    Ok(categories
        .into_iter()
        .map(|(name, mut blocks)| {
            blocks.sort_by(|a, b| a.name.cmp(&b.name));
            Category {
                name,
                blocks,
            }
        })
        .collect())
}

/// Lists the blocks of one root without reading any file contents.
fn discover_blocks(root: &Path, strict: bool) -> Result<Vec<Candidate>> {
    let mut found = Vec::new();

    for category in sorted_entries(root)? {
        if !category.is_dir() {
            continue;
        }
        let category_name = file_name(&category);
        let entries = sorted_entries(&category)?;

        let (files, dirs): (Vec<&PathBuf>, Vec<&PathBuf>) = entries.iter().partition(|p| p.is_file());
        let names: Vec<String> = files.iter().map(|p| file_name(p)).collect();

        for name in names.iter().filter(|n| !Block::is_test_file(n)) {
            let stem = Path::new(name).file_stem().map_or_else(|| name.clone(), |s| s.to_string_lossy().into_owned());
            let mut block_files = vec![name.clone()];
            block_files.extend(names.iter().filter(|n| is_test_of(n, &stem)).cloned());

            found.push(Candidate {
                category: category_name.clone(),
                tests: block_files.len() > 1,
                name: stem,
                root: root.to_path_buf(),
                dir: category.clone(),
                subdirectory: false,
                files: block_files,
            });
        }

        for dir in dirs {
            let name = file_name(dir);
            let id = block_id(&category_name, &name);
            let mut block_files = Vec::new();

            for entry in sorted_entries(dir)? {
                if entry.is_dir() {
                    let reason = format!("nested directory '{}' is not supported", file_name(&entry));
                    if strict {
                        return Err(BlockpmError::UnsupportedLayout {
                            block: id,
                            reason,
                        }
                        .into());
                    }
                    tracing::warn!("Skipping {} in block {}: {}", entry.display(), id, reason);
                    continue;
                }
                block_files.push(file_name(&entry));
            }

            if block_files.is_empty() {
                tracing::warn!("Skipping empty block directory {}", dir.display());
                continue;
            }

            found.push(Candidate {
                category: category_name.clone(),
                tests: block_files.iter().any(|f| Block::is_test_file(f)),
                name,
                root: root.to_path_buf(),
                dir: dir.clone(),
                subdirectory: true,
                files: block_files,
            });
        }
    }

    Ok(found)
}

/// `math.test.ts` and `math.spec.js` are tests of `math`.
fn is_test_of(file: &str, stem: &str) -> bool {
    crate::constants::TEST_FILE_INFIXES
        .iter()
        .any(|infix| file.strip_prefix(stem).is_some_and(|rest| rest.starts_with(infix)))
}

/// Non-hidden entries of `dir`, sorted by file name.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read directory {}", dir.display()))?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        entries.push(normalize_path(entry.path()));
    }
    Ok(entries)
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Per-build state shared by all scanned blocks.
struct Scanner<'a> {
    roots: &'a [PathBuf],
    options: &'a BuildOptions,
    lookup: ManifestLookup,
    aliases: HashMap<PathBuf, Option<AliasMatcher>>,
}

impl<'a> Scanner<'a> {
    fn new(roots: &'a [PathBuf], options: &'a BuildOptions) -> Result<Self> {
        let mut aliases = HashMap::new();
        for root in roots {
            let matcher = AliasMatcher::discover(root, options.search_boundary.as_deref())?;
            aliases.insert(root.clone(), matcher);
        }

        Ok(Self {
            roots,
            options,
            lookup: ManifestLookup::new(options.search_boundary.clone()),
            aliases,
        })
    }

    fn scan(&mut self, candidate: &Candidate, list: bool) -> Result<Block> {
        let id = candidate.id();
        let mut local_dependencies: BTreeSet<String> = BTreeSet::new();
        let mut imports: BTreeMap<String, String> = BTreeMap::new();
        let mut pinned = PinnedDependencies::default();

        for file in candidate.files.iter().filter(|f| !Block::is_test_file(f)) {
            let path = candidate.dir.join(file);
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read block file {}", path.display()))?;

            let dialect = Dialect::for_path(&path);
            let specifiers = extract(dialect, &content, &path)?;

            let alias_matcher = self.aliases.get(&candidate.root).and_then(Option::as_ref);
            let mut external = Vec::new();
            for specifier in specifiers {
                match classify(&specifier, &path, candidate.subdirectory, self.roots, alias_matcher)? {
                    Classification::Skip => {}
                    Classification::Local(local) => {
                        local_dependencies.insert(local.block_id);
                        imports.entry(specifier).or_insert(local.template);
                    }
                    Classification::External => external.push(specifier),
                }
            }

            let mut exclude = self.options.exclude_deps.clone();
            exclude.extend(dialect.reserved_packages().iter().map(ToString::to_string));
            pinned.merge(pin(&external, &path, &exclude, &mut self.lookup)?);
        }

        let directory_base = self.options.manifest_root.as_deref().unwrap_or(&candidate.root);
        let directory = to_forward_slashes(&relative_path(directory_base, &candidate.dir));
        tracing::debug!(
            "Built {} ({} files, {} local, {} external)",
            id,
            candidate.files.len(),
            local_dependencies.len(),
            pinned.dependencies.len() + pinned.dev_dependencies.len()
        );

        Ok(Block {
            name: candidate.name.clone(),
            category: candidate.category.clone(),
            directory,
            subdirectory: candidate.subdirectory,
            files: candidate.files.clone(),
            tests: candidate.tests,
            list,
            local_dependencies: local_dependencies.into_iter().collect(),
            dependencies: pinned.dependencies.into_iter().collect(),
            dev_dependencies: pinned.dev_dependencies.into_iter().collect(),
            imports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::BlockTreeFixture;

    fn find<'c>(categories: &'c [Category], id: &str) -> Option<&'c Block> {
        categories.iter().flat_map(|c| c.blocks.iter()).find(|b| b.id() == id)
    }

    fn sample_tree() -> BlockTreeFixture {
        BlockTreeFixture::new()
            .file("package.json", r#"{"dependencies": {"clsx": "2.1.0"}, "devDependencies": {"lodash": "4.17.21"}}"#)
            .file("blocks/utils/gcf.ts", "export const gcf = (a: number, b: number) => a;\n")
            .file("blocks/utils/gcf.test.ts", "import { gcf } from './gcf';\nimport { it } from 'vitest';\n")
            .file(
                "blocks/utils/math/index.ts",
                "export * from './add';\nimport { gcf } from '../gcf';\nimport fs from 'node:fs';\n",
            )
            .file("blocks/utils/math/add.ts", "import lodash from 'lodash';\nexport const add = 1;\n")
            .file(
                "blocks/format/print.ts",
                "import { add } from '../utils/math/add';\nimport clsx from 'clsx';\nimport x from 'unpinned';\n",
            )
    }

    #[test]
    fn test_build_layout() {
        let tree = sample_tree();
        let options = BuildOptions {
            manifest_root: Some(tree.path().to_path_buf()),
            ..BuildOptions::default()
        };
        let categories = build(&[tree.path().join("blocks")], &options).unwrap();

        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["format", "utils"]);

        let gcf = find(&categories, "utils/gcf").unwrap();
        assert!(!gcf.subdirectory);
        assert!(gcf.tests);
        assert_eq!(gcf.files, vec!["gcf.ts", "gcf.test.ts"]);
        assert_eq!(gcf.directory, "blocks/utils");
        // test files are never scanned
        assert!(gcf.dependencies.is_empty());

        let math = find(&categories, "utils/math").unwrap();
        assert!(math.subdirectory);
        assert_eq!(math.directory, "blocks/utils/math");
        assert_eq!(math.files, vec!["add.ts", "index.ts"]);
        assert_eq!(math.local_dependencies, vec!["utils/gcf"]);
        assert_eq!(math.imports.get("../gcf").map(String::as_str), Some("{{utils/gcf}}"));
        assert!(!math.imports.contains_key("./add"));
        assert_eq!(math.dev_dependencies, vec!["lodash@4.17.21"]);
        assert!(math.dependencies.is_empty());

        let print = find(&categories, "format/print").unwrap();
        assert_eq!(print.local_dependencies, vec!["utils/math"]);
        assert_eq!(print.imports["../utils/math/add"], "{{utils/math}}/add");
        assert_eq!(print.dependencies, vec!["clsx@2.1.0", "unpinned"]);
    }

    #[test]
    fn test_identifiers_are_unique() {
        let tree = sample_tree();
        let categories = build(&[tree.path().join("blocks")], &BuildOptions::default()).unwrap();

        let mut seen = BTreeSet::new();
        for block in categories.iter().flat_map(|c| &c.blocks) {
            assert!(seen.insert(block.id()), "duplicate {}", block.id());
            assert!(!block.local_dependencies.contains(&block.id()));
        }
    }

    #[test]
    fn test_duplicate_block_across_forms() {
        let tree = BlockTreeFixture::new()
            .file("blocks/utils/math.ts", "")
            .file("blocks/utils/math/index.ts", "");
        let err = build(&[tree.path().join("blocks")], &BuildOptions::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<BlockpmError>(), Some(BlockpmError::DuplicateBlock { .. })));
    }

    #[test]
    fn test_duplicate_block_across_roots() {
        let tree = BlockTreeFixture::new().file("a/utils/math.ts", "").file("b/utils/math.ts", "");
        let err = build(&[tree.path().join("a"), tree.path().join("b")], &BuildOptions::default())
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<BlockpmError>(), Some(BlockpmError::DuplicateBlock { .. })));
    }

    #[test]
    fn test_escaping_reference_fails_build() {
        let tree = BlockTreeFixture::new()
            .file("src/secret.ts", "")
            .file("blocks/utils/math.ts", "import s from '../../src/secret';\n");
        let err = build(&[tree.path().join("blocks")], &BuildOptions::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BlockpmError>(),
            Some(BlockpmError::UnresolvableReference { .. })
        ));
    }

    #[test]
    fn test_dot_slash_parent_in_multi_file_block_is_a_dependency() {
        let tree = BlockTreeFixture::new()
            .file("blocks/utils/gcf.ts", "export const gcf = 1;\n")
            .file("blocks/utils/math/index.ts", "import { gcf } from './../gcf';\nexport * from './add';\n")
            .file("blocks/utils/math/add.ts", "export const add = 1;\n");
        let categories = build(&[tree.path().join("blocks")], &BuildOptions::default()).unwrap();

        let math = find(&categories, "utils/math").unwrap();
        assert_eq!(math.local_dependencies, vec!["utils/gcf"]);
        assert!(math.imports.values().any(|template| template == "{{utils/gcf}}"));
    }

    #[test]
    fn test_dot_slash_escaping_tree_fails_build() {
        let tree = BlockTreeFixture::new()
            .file("blocks/utils/math/index.ts", "import key from './../../../secret/key';\n");
        let err = build(&[tree.path().join("blocks")], &BuildOptions::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BlockpmError>(),
            Some(BlockpmError::UnresolvableReference { .. })
        ));
    }

    #[test]
    fn test_regex_and_markup_in_js_block() {
        let tree = BlockTreeFixture::new()
            .file("blocks/utils/gcf.js", "export const gcf = 1;\n")
            .file(
                "blocks/ui/badge.js",
                "import { gcf } from '../utils/gcf';\nif (gcf) /'/.test('x');\nexport const Badge = () => <b>Don't</b>;\n",
            );
        let categories = build(&[tree.path().join("blocks")], &BuildOptions::default()).unwrap();
        assert_eq!(find(&categories, "ui/badge").unwrap().local_dependencies, vec!["utils/gcf"]);
    }

    #[test]
    fn test_parse_error_fails_build() {
        let tree = BlockTreeFixture::new().file("blocks/utils/bad.ts", "const a = 'unterminated;\n");
        let err = build(&[tree.path().join("blocks")], &BuildOptions::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<BlockpmError>(), Some(BlockpmError::ParseError { .. })));
    }

    #[test]
    fn test_nested_directory_warns_or_fails() {
        let tree = BlockTreeFixture::new()
            .file("blocks/ui/card/card.ts", "")
            .file("blocks/ui/card/parts/header.ts", "");

        let categories = build(&[tree.path().join("blocks")], &BuildOptions::default()).unwrap();
        assert_eq!(find(&categories, "ui/card").unwrap().files, vec!["card.ts"]);

        let strict = BuildOptions {
            strict: true,
            ..BuildOptions::default()
        };
        let err = build(&[tree.path().join("blocks")], &strict).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BlockpmError>(),
            Some(BlockpmError::UnsupportedLayout { .. })
        ));
    }

    #[test]
    fn test_excluded_dependency_is_readmitted_unlisted() {
        let tree = sample_tree();
        let options = BuildOptions {
            exclude_categories: vec!["utils".to_string()],
            ..BuildOptions::default()
        };
        let categories = build(&[tree.path().join("blocks")], &options).unwrap();

        assert!(find(&categories, "format/print").unwrap().list);
        // print → utils/math → utils/gcf
        assert!(!find(&categories, "utils/math").unwrap().list);
        assert!(!find(&categories, "utils/gcf").unwrap().list);
    }

    #[test]
    fn test_excluded_block_without_dependents_is_dropped() {
        let tree = sample_tree();
        let options = BuildOptions {
            exclude_blocks: vec!["format/*".to_string()],
            ..BuildOptions::default()
        };
        let categories = build(&[tree.path().join("blocks")], &options).unwrap();
        assert!(find(&categories, "format/print").is_none());
        assert!(find(&categories, "utils/math").unwrap().list);
    }

    #[test]
    fn test_do_not_list_keeps_block() {
        let tree = sample_tree();
        let options = BuildOptions {
            do_not_list_blocks: vec!["gcf".to_string()],
            ..BuildOptions::default()
        };
        let categories = build(&[tree.path().join("blocks")], &options).unwrap();
        assert!(!find(&categories, "utils/gcf").unwrap().list);
        assert!(find(&categories, "utils/math").unwrap().list);
    }

    #[test]
    fn test_excluded_deps_and_reserved_packages() {
        let tree = BlockTreeFixture::new()
            .file(
                "blocks/ui/button.svelte",
                "<script>\nimport { onMount } from 'svelte';\nimport clsx from 'clsx';\nimport z from 'zod';\n</script>\n",
            );
        let options = BuildOptions {
            exclude_deps: vec!["zod".to_string()],
            search_boundary: Some(tree.path().to_path_buf()),
            ..BuildOptions::default()
        };
        let categories = build(&[tree.path().join("blocks")], &options).unwrap();
        assert_eq!(find(&categories, "ui/button").unwrap().dependencies, vec!["clsx"]);
    }

    #[test]
    fn test_alias_reference_in_build() {
        let tree = BlockTreeFixture::new()
            .file("tsconfig.json", r#"{ "compilerOptions": { "paths": { "$blocks/*": ["blocks/*"] } } }"#)
            .file("blocks/utils/math.ts", "export const add = 1;\n")
            .file("blocks/ui/card.ts", "import { add } from '$blocks/utils/math.js';\n");
        let options = BuildOptions {
            search_boundary: Some(tree.path().to_path_buf()),
            ..BuildOptions::default()
        };
        let categories = build(&[tree.path().join("blocks")], &options).unwrap();

        let card = find(&categories, "ui/card").unwrap();
        assert_eq!(card.local_dependencies, vec!["utils/math"]);
        assert_eq!(card.imports["$blocks/utils/math.js"], "{{utils/math}}.js");
    }
}
