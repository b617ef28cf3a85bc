// Name-keyed child collections. Insertion order is preserved and doubles as
// display order, keys are unique within one parent.

use crate::error::ConsoleError;
use crate::model::EntityKind;

/// An entity uniquely keyed by name within its parent collection.
pub trait Named {
    const KIND: EntityKind;

    fn name(&self) -> &str;

    fn set_name(&mut self, name: String);
}

pub fn find<'a, T: Named>(items: &'a [T], name: &str) -> Option<&'a T> {
    items.iter().find(|item| item.name() == name)
}

pub fn find_mut<'a, T: Named>(items: &'a mut [T], name: &str) -> Option<&'a mut T> {
    items.iter_mut().find(|item| item.name() == name)
}

pub fn get<'a, T: Named>(items: &'a [T], name: &str) -> Result<&'a T, ConsoleError> {
    find(items, name).ok_or_else(|| ConsoleError::not_found(T::KIND, name))
}

pub fn get_mut<'a, T: Named>(items: &'a mut [T], name: &str) -> Result<&'a mut T, ConsoleError> {
    find_mut(items, name).ok_or_else(|| ConsoleError::not_found(T::KIND, name))
}

pub fn contains<T: Named>(items: &[T], name: &str) -> bool {
    find(items, name).is_some()
}

/// Appends `item`, failing when its name is already taken.
pub fn insert<T: Named>(items: &mut Vec<T>, item: T) -> Result<(), ConsoleError> {
    if item.name().trim().is_empty() {
        return Err(ConsoleError::invalid(T::KIND, "name must not be empty"));
    }
    if contains(items, item.name()) {
        return Err(ConsoleError::already_exists(T::KIND, item.name()));
    }
    items.push(item);
    Ok(())
}

pub fn remove<T: Named>(items: &mut Vec<T>, name: &str) -> Result<T, ConsoleError> {
    let index = items
        .iter()
        .position(|item| item.name() == name)
        .ok_or_else(|| ConsoleError::not_found(T::KIND, name))?;
    Ok(items.remove(index))
}

pub fn rename<T: Named>(items: &mut [T], from: &str, to: &str) -> Result<(), ConsoleError> {
    if to.trim().is_empty() {
        return Err(ConsoleError::invalid(T::KIND, "name must not be empty"));
    }
    if from != to && contains(items, to) {
        return Err(ConsoleError::already_exists(T::KIND, to));
    }
    get_mut(items, from)?.set_name(to.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Notifier;

    fn notifier(name: &str) -> Notifier {
        Notifier::new(name)
    }

    #[test]
    fn insert_rejects_duplicate_keys() {
        let mut items = vec![notifier("ops")];
        let err = insert(&mut items, notifier("ops")).unwrap_err();
        assert!(matches!(err, ConsoleError::AlreadyExists { .. }));
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn insert_rejects_blank_names() {
        let mut items: Vec<Notifier> = Vec::new();
        assert!(matches!(
            insert(&mut items, notifier("  ")),
            Err(ConsoleError::Invalid { .. })
        ));
    }

    #[test]
    fn rename_keeps_keys_unique() {
        let mut items = vec![notifier("ops"), notifier("dev")];
        assert!(rename(&mut items, "ops", "dev").is_err());
        rename(&mut items, "ops", "oncall").unwrap();
        assert_eq!(items[0].name(), "oncall");
        // Renaming to itself is a no-op, not a collision.
        rename(&mut items, "dev", "dev").unwrap();
    }

    #[test]
    fn remove_reports_missing_entries() {
        let mut items = vec![notifier("ops")];
        assert!(matches!(
            remove(&mut items, "dev"),
            Err(ConsoleError::NotFound { .. })
        ));
        assert_eq!(remove(&mut items, "ops").unwrap().name(), "ops");
        assert!(items.is_empty());
    }
}
