//! Reduces the index to one core per `maintainer:architecture`.

use std::collections::HashMap;

use corefetch_schema::{CoreDescriptor, CoreKey, PackageIndex, VersionOrdering};
use serde::Serialize;

/// The surviving descriptor for one `maintainer:architecture` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedCore {
    /// `maintainer:architecture`.
    pub key: CoreKey,
    /// Maintainer id of the publishing package.
    pub maintainer: String,
    /// The winning descriptor.
    pub descriptor: CoreDescriptor,
}

impl SelectedCore {
    /// Architecture id of the core.
    pub fn architecture(&self) -> &str {
        &self.descriptor.architecture
    }

    /// Version string of the core.
    pub fn version(&self) -> &str {
        &self.descriptor.version
    }
}

/// Selected cores in first-seen key order.
#[derive(Debug, Clone, Default)]
pub struct SelectedCores {
    cores: Vec<SelectedCore>,
    positions: HashMap<CoreKey, usize>,
}

impl SelectedCores {
    /// Look up the core selected for a key.
    pub fn get(&self, key: &CoreKey) -> Option<&SelectedCore> {
        self.positions.get(key).map(|&i| &self.cores[i])
    }

    /// Iterate selected cores in first-seen key order.
    pub fn iter(&self) -> std::slice::Iter<'_, SelectedCore> {
        self.cores.iter()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.cores.len()
    }

    /// True if the index contained no platforms.
    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }

    fn offer(&mut self, key: CoreKey, maintainer: &str, descriptor: &CoreDescriptor, ordering: VersionOrdering) {
        let Some(&i) = self.positions.get(&key) else {
            self.positions.insert(key.clone(), self.cores.len());
            self.cores.push(SelectedCore {
                key,
                maintainer: maintainer.to_string(),
                descriptor: descriptor.clone(),
            });
            return;
        };

        let current = &self.cores[i].descriptor.version;
        // Equal versions: the later entry wins.
        if !ordering.is_newer(current, &descriptor.version) {
            tracing::trace!(
                %key,
                from = %current,
                to = %descriptor.version,
                "Replacing selected core"
            );
            self.cores[i].descriptor = descriptor.clone();
        }
    }
}

impl<'a> IntoIterator for &'a SelectedCores {
    type Item = &'a SelectedCore;
    type IntoIter = std::slice::Iter<'a, SelectedCore>;

    fn into_iter(self) -> Self::IntoIter {
        self.cores.iter()
    }
}

/// Keep the newest descriptor for every `maintainer:architecture` key.
pub fn select_cores(index: &PackageIndex, ordering: VersionOrdering) -> SelectedCores {
    let mut selected = SelectedCores::default();
    for (package, platform) in index.platforms() {
        let key = CoreKey::new(&package.name, &platform.architecture);
        selected.offer(key, &package.name, platform, ordering);
    }
    tracing::debug!("Selected {} cores", selected.len());
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use corefetch_schema::Package;

    fn platform(arch: &str, version: &str, url: &str) -> CoreDescriptor {
        CoreDescriptor {
            architecture: arch.into(),
            version: version.into(),
            url: url.into(),
            ..CoreDescriptor::default()
        }
    }

    fn index(packages: Vec<(&str, Vec<CoreDescriptor>)>) -> PackageIndex {
        PackageIndex {
            packages: packages
                .into_iter()
                .map(|(name, platforms)| Package {
                    name: name.into(),
                    platforms,
                    ..Package::default()
                })
                .collect(),
        }
    }

    fn pick(idx: &PackageIndex, key: &str, ordering: VersionOrdering) -> String {
        let (maintainer, arch) = key.split_once(':').unwrap();
        select_cores(idx, ordering)
            .get(&CoreKey::new(maintainer, arch))
            .unwrap()
            .version()
            .to_string()
    }

    #[test]
    fn keeps_highest_version() {
        let idx = index(vec![(
            "arduino",
            vec![platform("avr", "1.6.0", "a"), platform("avr", "1.6.9", "b")],
        )]);
        assert_eq!(pick(&idx, "arduino:avr", VersionOrdering::Ordinal), "1.6.9");

        let idx = index(vec![(
            "arduino",
            vec![platform("avr", "1.6.9", "a"), platform("avr", "1.6.0", "b")],
        )]);
        assert_eq!(pick(&idx, "arduino:avr", VersionOrdering::Ordinal), "1.6.9");
    }

    #[test]
    fn ordinal_ordering_keeps_1_6_9_over_1_6_10() {
        let idx = index(vec![(
            "arduino",
            vec![platform("avr", "1.6.9", "a"), platform("avr", "1.6.10", "b")],
        )]);
        assert_eq!(pick(&idx, "arduino:avr", VersionOrdering::Ordinal), "1.6.9");
        assert_eq!(pick(&idx, "arduino:avr", VersionOrdering::Semantic), "1.6.10");
    }

    #[test]
    fn exactly_one_entry_per_key() {
        let idx = index(vec![
            (
                "arduino",
                vec![
                    platform("avr", "1.6.0", "a"),
                    platform("sam", "1.6.4", "b"),
                    platform("avr", "1.6.2", "c"),
                ],
            ),
            ("intel", vec![platform("avr", "0.1.0", "d")]),
        ]);
        let selected = select_cores(&idx, VersionOrdering::Ordinal);
        assert_eq!(selected.len(), 3);
        let keys: Vec<&str> = selected.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["arduino:avr", "arduino:sam", "intel:avr"]);
    }

    #[test]
    fn equal_versions_last_seen_wins() {
        let idx = index(vec![(
            "arduino",
            vec![platform("avr", "1.6.0", "first"), platform("avr", "1.6.0", "second")],
        )]);
        let selected = select_cores(&idx, VersionOrdering::Ordinal);
        let core = selected.get(&CoreKey::new("arduino", "avr")).unwrap();
        assert_eq!(core.descriptor.url, "second");
    }

    #[test]
    fn same_architecture_under_different_maintainers_is_distinct() {
        let idx = index(vec![
            ("arduino", vec![platform("avr", "1.0.0", "a")]),
            ("adafruit", vec![platform("avr", "2.0.0", "b")]),
        ]);
        let selected = select_cores(&idx, VersionOrdering::Ordinal);
        assert_eq!(selected.len(), 2);
        assert_eq!(
            selected.get(&CoreKey::new("arduino", "avr")).unwrap().maintainer,
            "arduino"
        );
    }

    #[test]
    fn empty_index_selects_nothing() {
        assert!(select_cores(&PackageIndex::default(), VersionOrdering::Ordinal).is_empty());
    }
}
