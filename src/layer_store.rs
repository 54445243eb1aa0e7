use crate::layers::{Layer, LayerId, LayerPatch, LayerType};

/// Ordered annotation layers. Index 0 is the back; the last entry paints on top.
#[derive(Clone, Debug, Default)]
pub struct LayerStore {
    layers: Vec<Layer>,
    selected: Option<LayerId>,
    next_id: u64,
}

impl LayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids are handed out monotonically and never reused, even after `clear`.
    pub fn next_id(&mut self) -> LayerId {
        self.next_id += 1;
        LayerId(self.next_id)
    }

    /// `"<Kind> N"` where N is one more than the existing count of that kind.
    pub fn next_name(&self, kind: LayerType) -> String {
        let count = self
            .layers
            .iter()
            .filter(|l| l.layer_type() == kind)
            .count();
        format!("{} {}", kind.label(), count + 1)
    }

    /// Appends at the front. Returns `false` if the id is already present.
    pub fn add(&mut self, layer: Layer) -> bool {
        if self.contains(layer.id) {
            log::warn!("Rejected duplicate layer id {:?}", layer.id);
            return false;
        }
        if layer.id.0 > self.next_id {
            self.next_id = layer.id.0;
        }
        log::info!("Added layer '{}' ({:?})", layer.name, layer.id);
        self.layers.push(layer);
        true
    }

    pub fn remove(&mut self, id: LayerId) -> Option<Layer> {
        let index = self.index_of(id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        let layer = self.layers.remove(index);
        log::info!("Removed layer '{}' ({:?})", layer.name, id);
        Some(layer)
    }

    pub fn update(&mut self, id: LayerId, patch: &LayerPatch) -> bool {
        match self.get_mut(id) {
            Some(layer) => {
                layer.apply(patch);
                true
            }
            None => false,
        }
    }

    /// One step toward the front.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index + 1 >= self.layers.len() {
            return false;
        }
        self.layers.swap(index, index + 1);
        true
    }

    /// One step toward the back.
    pub fn move_down(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.layers.len() {
            return false;
        }
        self.layers.swap(index, index - 1);
        true
    }

    /// Drag-and-drop reorder: take `from` out and reinsert it at `to`.
    pub fn move_to(&mut self, from: usize, to: usize) -> bool {
        let len = self.layers.len();
        if from >= len || to >= len {
            return false;
        }
        if from == to {
            return true;
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        true
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> bool {
        self.update(
            id,
            &LayerPatch {
                visible: Some(visible),
                ..Default::default()
            },
        )
    }

    pub fn set_locked(&mut self, id: LayerId, locked: bool) -> bool {
        self.update(
            id,
            &LayerPatch {
                locked: Some(locked),
                ..Default::default()
            },
        )
    }

    pub fn toggle_visible(&mut self, id: LayerId) -> bool {
        match self.get(id).map(|l| l.visible) {
            Some(v) => self.set_visible(id, !v),
            None => false,
        }
    }

    pub fn toggle_locked(&mut self, id: LayerId) -> bool {
        match self.get(id).map(|l| l.locked) {
            Some(v) => self.set_locked(id, !v),
            None => false,
        }
    }

    /// Selecting an unknown id clears the selection.
    pub fn select(&mut self, id: Option<LayerId>) {
        self.selected = id.filter(|id| self.contains(*id));
    }

    pub fn selected_id(&self) -> Option<LayerId> {
        self.selected
    }

    pub fn selected(&self) -> Option<&Layer> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.index_of(id).is_some()
    }

    /// Store order, back to front.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Front to back with store indices, for the layers panel.
    pub fn display_order(&self) -> impl Iterator<Item = (usize, &Layer)> {
        self.layers.iter().enumerate().rev()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn clear(&mut self) {
        self.layers.clear();
        self.selected = None;
    }
}
