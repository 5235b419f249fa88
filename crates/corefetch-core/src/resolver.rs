//! Tool dependency resolution.
//!
//! Every package's tools go into one global [`ToolCatalog`]. A selected core's
//! `toolsDependencies` are looked up there, given a role, and narrowed to the
//! single system variant that runs on the target host.

use std::collections::HashMap;

use corefetch_schema::{
    CoreKey, HostBucket, PackageIndex, ToolDescriptor, ToolKey, ToolRef, ToolSystem, host_matches,
};
use serde::Serialize;
use thiserror::Error;

use crate::select::SelectedCore;

/// A core depends on a tool that no package in the index publishes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("core {core} depends on {dependency}, which is not in the tool catalog")]
pub struct MissingDependencyError {
    /// The core whose dependency failed to resolve.
    pub core: CoreKey,
    /// The unresolved reference.
    pub dependency: ToolRef,
}

/// All tools in the index keyed by `packager:name:version`.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: HashMap<ToolKey, ToolDescriptor>,
}

impl ToolCatalog {
    /// Build the catalog from every package's tool list. A later duplicate key
    /// replaces an earlier one.
    pub fn from_index(index: &PackageIndex) -> Self {
        let tools = index
            .tools()
            .map(|(package, tool)| {
                (
                    ToolKey::new(&package.name, &tool.name, &tool.version),
                    tool.clone(),
                )
            })
            .collect();
        Self { tools }
    }

    /// Look up a tool.
    pub fn get(&self, key: &ToolKey) -> Option<&ToolDescriptor> {
        self.tools.get(key)
    }

    /// Number of distinct tool keys.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True if the index published no tools.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// The part a tool plays in a core's build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolRole {
    /// The toolchain compiler.
    Compiler,
    /// Any other tool, numbered from 1 in dependency order.
    Tool(usize),
}

impl std::fmt::Display for ToolRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compiler => write!(f, "compiler"),
            Self::Tool(n) => write!(f, "tool{n}"),
        }
    }
}

impl Serialize for ToolRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A host variant of a tool and the bucket it classified into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostVariant {
    /// Host triple as published.
    pub host: String,
    /// Bucket the host classified into.
    pub bucket: HostBucket,
}

/// A dependency narrowed to the system variant for the target host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTool {
    /// The reference from the core.
    pub reference: ToolRef,
    /// Role in the build.
    pub role: ToolRole,
    /// The catalog entry.
    pub descriptor: ToolDescriptor,
    /// The variant to download.
    pub system: ToolSystem,
    /// Every published variant that classified into a bucket, in index order.
    pub variants: Vec<HostVariant>,
}

/// A dependency with no variant for the target host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTool {
    /// The reference from the core.
    pub reference: ToolRef,
    /// Role in the build.
    pub role: ToolRole,
    /// Hosts the tool is published for.
    pub available_hosts: Vec<String>,
}

/// Result of resolving one core's dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Tools to acquire, in dependency order.
    pub tools: Vec<ResolvedTool>,
    /// Tools with no variant for the target host.
    pub skipped: Vec<SkippedTool>,
}

/// True if a dependency counts as the compiler: its name contains `gcc`, or
/// its first system is served from a `toolchain` URL.
pub fn is_compiler(name: &str, descriptor: &ToolDescriptor) -> bool {
    name.contains("gcc")
        || descriptor
            .systems
            .first()
            .is_some_and(|s| s.url.contains("toolchain"))
}

/// Classify every system of a tool, dropping the ones in no bucket.
pub fn bucket_variants(descriptor: &ToolDescriptor) -> Vec<HostVariant> {
    descriptor
        .systems
        .iter()
        .filter_map(|s| {
            HostBucket::classify(&s.host).map(|bucket| HostVariant {
                host: s.host.clone(),
                bucket,
            })
        })
        .collect()
}

/// Pick the system to download for `target_host`: an exact host match first,
/// then the first system in the same bucket.
pub fn select_system<'a>(systems: &'a [ToolSystem], target_host: &str) -> Option<&'a ToolSystem> {
    systems
        .iter()
        .find(|s| s.host == target_host)
        .or_else(|| systems.iter().find(|s| host_matches(&s.host, target_host)))
}

/// Resolve a core's tool dependencies against the catalog.
///
/// # Errors
///
/// Returns [`MissingDependencyError`] for the first dependency that is not in
/// the catalog. A dependency with no variant for `target_host` is not an
/// error; it lands in [`Resolution::skipped`].
pub fn resolve_tools(
    core: &SelectedCore,
    catalog: &ToolCatalog,
    target_host: &str,
) -> Result<Resolution, MissingDependencyError> {
    let mut resolution = Resolution::default();
    let mut next_tool = 1;

    for dep in &core.descriptor.dependencies {
        let descriptor = catalog
            .get(&dep.key())
            .ok_or_else(|| MissingDependencyError {
                core: core.key.clone(),
                dependency: dep.clone(),
            })?;

        let role = if is_compiler(&dep.name, descriptor) {
            ToolRole::Compiler
        } else {
            let role = ToolRole::Tool(next_tool);
            next_tool += 1;
            role
        };

        if let Some(system) = select_system(&descriptor.systems, target_host) {
            tracing::debug!(tool = %dep, host = %system.host, %role, "Resolved tool");
            resolution.tools.push(ResolvedTool {
                reference: dep.clone(),
                role,
                descriptor: descriptor.clone(),
                system: system.clone(),
                variants: bucket_variants(descriptor),
            });
        } else {
            tracing::warn!(
                core = %core.key,
                tool = %dep,
                target = target_host,
                "No artifact for target host, skipping tool"
            );
            resolution.skipped.push(SkippedTool {
                reference: dep.clone(),
                role,
                available_hosts: descriptor.systems.iter().map(|s| s.host.clone()).collect(),
            });
        }
    }

    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use corefetch_schema::{CoreDescriptor, Package};

    fn system(host: &str, url: &str) -> ToolSystem {
        ToolSystem {
            host: host.into(),
            url: url.into(),
            ..ToolSystem::default()
        }
    }

    fn tool(name: &str, version: &str, systems: Vec<ToolSystem>) -> ToolDescriptor {
        ToolDescriptor {
            name: name.into(),
            version: version.into(),
            systems,
        }
    }

    fn dep(packager: &str, name: &str, version: &str) -> ToolRef {
        ToolRef {
            packager: packager.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    fn core(deps: Vec<ToolRef>) -> SelectedCore {
        SelectedCore {
            key: CoreKey::new("arduino", "avr"),
            maintainer: "arduino".into(),
            descriptor: CoreDescriptor {
                architecture: "avr".into(),
                version: "1.6.0".into(),
                dependencies: deps,
                ..CoreDescriptor::default()
            },
        }
    }

    fn catalog(packages: Vec<(&str, Vec<ToolDescriptor>)>) -> ToolCatalog {
        ToolCatalog::from_index(&PackageIndex {
            packages: packages
                .into_iter()
                .map(|(name, tools)| Package {
                    name: name.into(),
                    tools,
                    ..Package::default()
                })
                .collect(),
        })
    }

    #[test]
    fn missing_dependency_is_an_error() {
        let cat = catalog(vec![("arduino", vec![])]);
        let err = resolve_tools(
            &core(vec![dep("arduino", "avr-gcc", "4.9")]),
            &cat,
            "x86_64-linux-gnu",
        )
        .unwrap_err();
        assert_eq!(err.dependency.name, "avr-gcc");
        assert_eq!(err.core.as_str(), "arduino:avr");
        assert!(err.to_string().contains("arduino:avr-gcc:4.9"));
    }

    #[test]
    fn version_mismatch_is_missing() {
        let cat = catalog(vec![(
            "arduino",
            vec![tool("avr-gcc", "4.8", vec![system("x86_64-linux-gnu", "u")])],
        )]);
        assert!(
            resolve_tools(
                &core(vec![dep("arduino", "avr-gcc", "4.9")]),
                &cat,
                "x86_64-linux-gnu"
            )
            .is_err()
        );
    }

    #[test]
    fn catalog_is_global_across_maintainers() {
        let cat = catalog(vec![
            ("arduino", vec![]),
            (
                "intel",
                vec![tool("arc-elf32", "1.0", vec![system("x86_64-linux-gnu", "u")])],
            ),
        ]);
        let res = resolve_tools(
            &core(vec![dep("intel", "arc-elf32", "1.0")]),
            &cat,
            "x86_64-linux-gnu",
        )
        .unwrap();
        assert_eq!(res.tools.len(), 1);
    }

    #[test]
    fn roles_follow_dependency_order() {
        let cat = catalog(vec![(
            "arduino",
            vec![
                tool("avrdude", "6.0", vec![system("x86_64-linux-gnu", "http://x/avrdude")]),
                tool("avr-gcc", "4.9", vec![system("x86_64-linux-gnu", "http://x/gcc")]),
                tool(
                    "arc-elf32",
                    "1.0",
                    vec![system("x86_64-linux-gnu", "http://x/toolchain/arc.tar.gz")],
                ),
                tool("bossac", "1.6", vec![system("x86_64-linux-gnu", "http://x/bossac")]),
            ],
        )]);
        let res = resolve_tools(
            &core(vec![
                dep("arduino", "avrdude", "6.0"),
                dep("arduino", "avr-gcc", "4.9"),
                dep("arduino", "arc-elf32", "1.0"),
                dep("arduino", "bossac", "1.6"),
            ]),
            &cat,
            "x86_64-linux-gnu",
        )
        .unwrap();
        let roles: Vec<ToolRole> = res.tools.iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![
                ToolRole::Tool(1),
                ToolRole::Compiler,
                ToolRole::Compiler,
                ToolRole::Tool(2)
            ]
        );
    }

    #[test]
    fn tool_without_systems_is_classified_by_name_only() {
        let empty = tool("openocd", "0.9", vec![]);
        assert!(!is_compiler("openocd", &empty));
        assert!(is_compiler("avr-gcc", &tool("avr-gcc", "1", vec![])));
    }

    #[test]
    fn host_miss_skips_instead_of_failing() {
        let cat = catalog(vec![(
            "arduino",
            vec![tool(
                "avrdude",
                "6.0",
                vec![
                    system("i686-mingw32", "w"),
                    system("x86_64-apple-darwin", "m"),
                ],
            )],
        )]);
        let res = resolve_tools(
            &core(vec![dep("arduino", "avrdude", "6.0")]),
            &cat,
            "x86_64-linux-gnu",
        )
        .unwrap();
        assert!(res.tools.is_empty());
        assert_eq!(res.skipped.len(), 1);
        assert_eq!(
            res.skipped[0].available_hosts,
            vec!["i686-mingw32", "x86_64-apple-darwin"]
        );
    }

    #[test]
    fn exact_host_beats_bucket_match() {
        let systems = vec![
            system("x86_64-pc-linux-gnu", "bucket"),
            system("x86_64-linux-gnu", "exact"),
        ];
        assert_eq!(
            select_system(&systems, "x86_64-linux-gnu").unwrap().url,
            "exact"
        );
        assert_eq!(
            select_system(&systems[..1], "x86_64-linux-gnu").unwrap().url,
            "bucket"
        );
    }

    #[test]
    fn variants_drop_unbucketed_hosts() {
        let t = tool(
            "avr-gcc",
            "4.9",
            vec![
                system("aarch64-linux-gnu", "a"),
                system("x86_64-linux-gnu", "b"),
                system("i386-apple-darwin11", "c"),
            ],
        );
        let variants = bucket_variants(&t);
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].bucket, HostBucket::LinuxX86_64);
        assert_eq!(variants[1].bucket, HostBucket::Darwin);
    }

    #[test]
    fn bucket_assignment_ignores_system_order() {
        let forward = tool(
            "t",
            "1",
            vec![system("x86_64-linux-gnu", "a"), system("i686-mingw32", "b")],
        );
        let reversed = tool(
            "t",
            "1",
            vec![system("i686-mingw32", "b"), system("x86_64-linux-gnu", "a")],
        );
        let mut a = bucket_variants(&forward);
        let mut b = bucket_variants(&reversed);
        a.sort_by(|x, y| x.host.cmp(&y.host));
        b.sort_by(|x, y| x.host.cmp(&y.host));
        assert_eq!(a, b);
    }
}
