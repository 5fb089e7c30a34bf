//! # Formation: the desired topology.
//!
//! A [`Formation`] maps service names to desired instance counts, in
//! insertion order. `None` means "use the service's own default count"; an
//! explicit `Some(0)` means "run zero instances of this service".

/// Ordered mapping from service name to desired instance count.
#[derive(Clone, Debug, Default)]
pub struct Formation {
    entries: Vec<(String, Option<usize>)>,
}

impl Formation {
    /// Creates an empty formation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the desired count for a service.
    ///
    /// Re-setting an existing name updates it in place, preserving the
    /// original position in the formation order.
    pub fn set(&mut self, name: impl Into<String>, count: Option<usize>) -> &mut Self {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = count,
            None => self.entries.push((name, count)),
        }
        self
    }

    /// Looks up the desired count for a service.
    ///
    /// `None` means the name is absent; `Some(None)` means present with the
    /// default count.
    pub fn get(&self, name: &str) -> Option<Option<usize>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, count)| *count)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<usize>)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), *c))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the formation names no services.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, Option<usize>)> for Formation {
    fn from_iter<T: IntoIterator<Item = (N, Option<usize>)>>(iter: T) -> Self {
        let mut formation = Formation::new();
        for (name, count) in iter {
            formation.set(name, count);
        }
        formation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut formation = Formation::new();
        formation.set("web", Some(2)).set("worker", None).set("clock", Some(1));
        let names: Vec<&str> = formation.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["web", "worker", "clock"]);
    }

    #[test]
    fn reset_updates_in_place() {
        let mut formation = Formation::new();
        formation.set("web", Some(1)).set("worker", Some(1)).set("web", Some(4));
        assert_eq!(formation.get("web"), Some(Some(4)));
        let names: Vec<&str> = formation.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["web", "worker"]);
    }

    #[test]
    fn absent_vs_default_vs_zero() {
        let formation: Formation =
            [("worker", None), ("clock", Some(0))].into_iter().collect();
        assert_eq!(formation.get("missing"), None);
        assert_eq!(formation.get("worker"), Some(None));
        assert_eq!(formation.get("clock"), Some(Some(0)));
    }
}
