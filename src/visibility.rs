use crate::registry::{BodyId, BodyRegistry};

/// Group label → member ids, in first-appearance order.
#[derive(Clone, Debug, Default)]
pub struct VisibilityIndex {
    groups: Vec<(String, Vec<BodyId>)>,
}

impl VisibilityIndex {
    pub fn build(registry: &BodyRegistry) -> Self {
        let mut groups: Vec<(String, Vec<BodyId>)> = Vec::new();
        for (id, body) in registry.iter() {
            match groups.iter_mut().find(|(g, _)| *g == body.group) {
                Some((_, members)) => members.push(id),
                None => groups.push((body.group.clone(), vec![id])),
            }
        }
        Self { groups }
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(g, _)| g.as_str())
    }

    pub fn members(&self, group: &str) -> &[BodyId] {
        self.groups
            .iter()
            .find(|(g, _)| g == group)
            .map(|(_, m)| m.as_slice())
            .unwrap_or(&[])
    }

    /// Sets `visible` on every member. Unknown groups touch nothing.
    /// Returns the number of bodies updated.
    pub fn set_visible(&self, registry: &mut BodyRegistry, group: &str, visible: bool) -> usize {
        let members = self.members(group);
        for &id in members {
            registry.set_visible(id, visible);
        }
        members.len()
    }

    pub fn is_visible(&self, registry: &BodyRegistry, group: &str) -> bool {
        self.members(group)
            .iter()
            .all(|&id| registry.get(id).is_some_and(|b| b.visible))
    }
}
