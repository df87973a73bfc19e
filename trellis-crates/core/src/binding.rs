use crate::containers::HashMap;
use crate::model::DecisionVariable;
use crate::model::VariableId;

/// Maps decision variables to the handles a backend created for them. Every variable gets at most
/// one handle per session, created on first use.
#[derive(Debug)]
pub(crate) struct BindingCache<Handle> {
    handles: HashMap<VariableId, Handle>,
}

impl<Handle> Default for BindingCache<Handle> {
    fn default() -> Self {
        BindingCache {
            handles: HashMap::default(),
        }
    }
}

impl<Handle: Clone> BindingCache<Handle> {
    pub(crate) fn get(&self, variable: &DecisionVariable) -> Option<Handle> {
        self.handles.get(&variable.id()).cloned()
    }

    /// The handle of `variable`, calling `create` if it has none yet.
    pub(crate) fn bind<E>(
        &mut self,
        variable: &DecisionVariable,
        create: impl FnOnce(&DecisionVariable) -> Result<Handle, E>,
    ) -> Result<Handle, E> {
        if let Some(handle) = self.handles.get(&variable.id()) {
            return Ok(handle.clone());
        }

        let handle = create(variable)?;
        let _ = self.handles.insert(variable.id(), handle.clone());
        Ok(handle)
    }

    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IntVar;

    #[test]
    fn binding_is_idempotent() {
        let x = IntVar::new(0, 3);
        let mut cache = BindingCache::default();
        let mut created = 0;

        for _ in 0..3 {
            let handle = cache
                .bind(x.variable(), |variable| {
                    created += 1;
                    Ok::<_, ()>(variable.name().to_owned())
                })
                .expect("creation succeeds");
            assert_eq!(handle, x.name());
        }

        assert_eq!(created, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(x.variable()), Some(x.name().to_owned()));
    }

    #[test]
    fn failed_creation_is_not_cached() {
        let x = IntVar::new(0, 3);
        let mut cache = BindingCache::<u32>::default();

        assert!(cache.bind(x.variable(), |_| Err("no")).is_err());
        assert!(cache.get(x.variable()).is_none());
        assert_eq!(cache.bind(x.variable(), |_| Ok::<_, &str>(7)), Ok(7));
    }
}
