use std::fmt;
use std::hash::Hash;

use thiserror::Error;

use crate::common::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent<K> {
    Managed(K),
    Unmanaged(K),
    Cleared,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{kind} {id} is already managed")]
    AlreadyManaged { kind: &'static str, id: String },
    #[error("{kind} {id} is not managed")]
    NotManaged { kind: &'static str, id: String },
}

type Observer<K, V> = Box<dyn FnMut(RegistryEvent<K>, &Registry<K, V>)>;

/// Id-keyed collection of entities that remembers the order they were
/// managed in and notifies subscribers of membership changes.
pub struct Registry<K, V> {
    kind: &'static str,
    entries: HashMap<K, V>,
    order: Vec<K>,
    observers: Vec<Observer<K, V>>,
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Registry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("order", &self.order)
            .field("entries", &self.entries)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl<K, V> Registry<K, V>
where K: Copy + Eq + Hash + fmt::Display
{
    /// `kind` names the entities in error messages.
    pub fn new(kind: &'static str) -> Self {
        Registry {
            kind,
            entries: HashMap::default(),
            order: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn manage(&mut self, id: K, value: V) -> Result<&mut V, RegistryError> {
        self.check_vacant(id)?;
        self.entries.insert(id, value);
        self.order.push(id);
        self.notify(RegistryEvent::Managed(id));
        self.at_mut(id)
    }

    pub fn unmanage(&mut self, id: K) -> Result<V, RegistryError> {
        let value = self.entries.remove(&id).ok_or_else(|| self.not_managed(id))?;
        self.order.retain(|k| *k != id);
        self.notify(RegistryEvent::Unmanaged(id));
        Ok(value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.notify(RegistryEvent::Cleared);
    }

    pub fn at(&self, id: K) -> Result<&V, RegistryError> {
        self.entries.get(&id).ok_or_else(|| self.not_managed(id))
    }

    pub fn at_mut(&mut self, id: K) -> Result<&mut V, RegistryError> {
        let kind = self.kind;
        self.entries.get_mut(&id).ok_or_else(|| RegistryError::NotManaged { kind, id: id.to_string() })
    }

    pub fn lookup(&self, id: K) -> Option<&V> { self.entries.get(&id) }

    pub fn lookup_mut(&mut self, id: K) -> Option<&mut V> { self.entries.get_mut(&id) }

    pub fn contains(&self, id: K) -> bool { self.entries.contains_key(&id) }

    pub fn check_vacant(&self, id: K) -> Result<(), RegistryError> {
        if self.contains(id) {
            return Err(RegistryError::AlreadyManaged { kind: self.kind, id: id.to_string() });
        }
        Ok(())
    }

    pub fn len(&self) -> usize { self.order.len() }

    pub fn is_empty(&self) -> bool { self.order.is_empty() }

    /// Ids in the order they were managed.
    pub fn ids(&self) -> impl Iterator<Item = K> + '_ { self.order.iter().copied() }

    /// Entries in the order they were managed.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.order.iter().map(|id| (*id, &self.entries[id]))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ { self.entries.values_mut() }

    /// Registers an observer. Observers run in registration order after the
    /// registry has been updated.
    pub fn subscribe(&mut self, observer: impl FnMut(RegistryEvent<K>, &Registry<K, V>) + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn notify(&mut self, event: RegistryEvent<K>) {
        let mut observers = std::mem::take(&mut self.observers);
        for observer in &mut observers {
            observer(event, self);
        }
        self.observers = observers;
    }

    fn not_managed(&self, id: K) -> RegistryError {
        RegistryError::NotManaged { kind: self.kind, id: id.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;

    fn recording(registry: &mut Registry<u32, &'static str>) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        registry.subscribe(move |event, reg| {
            sink.borrow_mut().push(format!("{event:?} len={}", reg.len()));
        });
        log
    }

    #[test]
    fn manage_and_lookup() {
        let mut reg = Registry::new("window");
        reg.manage(2, "b").unwrap();
        reg.manage(1, "a").unwrap();
        assert_eq!(reg.at(1), Ok(&"a"));
        assert_eq!(reg.lookup(3), None);
        assert_eq!(reg.ids().collect::<Vec<_>>(), [2, 1]);
        assert_eq!(reg.iter().map(|(_, v)| *v).collect::<Vec<_>>(), ["b", "a"]);
        *reg.at_mut(2).unwrap() = "B";
        assert_eq!(reg.lookup(2), Some(&"B"));
    }

    #[test]
    fn duplicate_and_missing_ids() {
        let mut reg = Registry::new("window");
        reg.manage(1, "a").unwrap();
        assert_eq!(
            reg.manage(1, "again").unwrap_err(),
            RegistryError::AlreadyManaged { kind: "window", id: "1".into() }
        );
        assert_eq!(reg.at(1), Ok(&"a"));
        assert_eq!(
            reg.unmanage(5).unwrap_err().to_string(),
            "window 5 is not managed"
        );
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn observers_see_updated_state_in_order() {
        let mut reg = Registry::new("monitor");
        let log = recording(&mut reg);
        let second = Rc::new(RefCell::new(0));
        let counter = second.clone();
        reg.subscribe(move |_, _| *counter.borrow_mut() += 1);

        reg.manage(1, "a").unwrap();
        reg.manage(2, "b").unwrap();
        assert_eq!(reg.unmanage(1), Ok("a"));
        reg.clear();

        assert_eq!(
            *log.borrow(),
            ["Managed(1) len=1", "Managed(2) len=2", "Unmanaged(1) len=1", "Cleared len=0"]
        );
        assert_eq!(*second.borrow(), 4);
        assert!(reg.is_empty());
    }

    #[test]
    fn failed_operations_do_not_notify() {
        let mut reg = Registry::new("workspace");
        reg.manage(1, "a").unwrap();
        let log = recording(&mut reg);
        let _ = reg.manage(1, "a");
        let _ = reg.unmanage(2);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn unmanage_keeps_remaining_order() {
        let mut reg = Registry::new("window");
        for id in [5, 3, 9] {
            reg.manage(id, "x").unwrap();
        }
        reg.unmanage(3).unwrap();
        assert_eq!(reg.ids().collect::<Vec<_>>(), [5, 9]);
    }
}
