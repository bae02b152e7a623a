//! Keeps the navigator and the panel set in step with the store

use crate::error::{Result, ViewerError};
use crate::state::events::StoreEvent;
use crate::state::navigator::{Navigator, NavigatorRow};
use crate::state::panel::{MountedPanel, Panel, PanelFactory};
use crate::store::AppStore;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Syncing,
}

/// Applies store events to the UI surfaces, one at a time and in order.
///
/// The synchronizer owns the navigator rows and one mounted panel per
/// entry. It reads the store but never writes to it.
pub struct ViewSynchronizer<F: PanelFactory> {
    factory: F,
    navigator: Navigator,
    panels: HashMap<String, MountedPanel<F::Panel>>,
    visible: Option<String>,
    state: SyncState,

    /// Event history for debugging
    event_history: VecDeque<StoreEvent>,

    /// Maximum event history size
    max_history: usize,
}

impl<F: PanelFactory> ViewSynchronizer<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            navigator: Navigator::new(),
            panels: HashMap::new(),
            visible: None,
            state: SyncState::Idle,
            event_history: VecDeque::new(),
            max_history: 100,
        }
    }

    /// Drain the store's pending events and apply each in emission order.
    ///
    /// Stops at the first failing event; the rest stay unapplied and a
    /// [`ViewSynchronizer::reconcile`] brings the view back in line.
    pub fn sync(&mut self, store: &mut AppStore) -> Result<usize> {
        let events = store.drain_events();
        let count = events.len();
        for event in events {
            self.dispatch(store, event)?;
        }
        Ok(count)
    }

    /// Apply one event. Refused with `SyncBusy` while another is in flight.
    pub fn dispatch(&mut self, store: &AppStore, event: StoreEvent) -> Result<()> {
        if self.state == SyncState::Syncing {
            warn!("ViewSynchronizer: refusing {:?}, still syncing", event);
            return Err(ViewerError::SyncBusy);
        }

        debug!("ViewSynchronizer: dispatching {:?}", event);
        self.event_history.push_back(event.clone());
        if self.event_history.len() > self.max_history {
            self.event_history.pop_front();
        }

        self.state = SyncState::Syncing;
        self.apply(store, event);
        self.state = SyncState::Idle;
        Ok(())
    }

    fn apply(&mut self, store: &AppStore, event: StoreEvent) {
        match event {
            StoreEvent::EntryAdded { name, index } => {
                let shape = store.entry(&name).map_or((0, 0), |e| e.data().shape());
                self.navigator.insert_row(index, NavigatorRow::new(&name, shape));
                self.mount(store, &name);
            }
            StoreEvent::EntryRemoved { name } => {
                self.navigator.remove_row(&name);
                if self.visible.as_deref() == Some(name.as_str()) {
                    self.visible = None;
                }
                // Dropping the mount releases the panel
                self.panels.remove(&name);
            }
            StoreEvent::SelectionChanged { name } => self.show(store, name),
            StoreEvent::EntryUpdated { name } => {
                if let Some(entry) = store.entry(&name) {
                    self.navigator.update_shape(&name, entry.data().shape());
                    if let Some(panel) = self.panels.get_mut(&name) {
                        panel.reload(entry);
                    }
                }
            }
        }
    }

    /// Create the panel for `name` unless it already exists. An entry that is
    /// gone from the store by the time its event is applied gets no panel.
    fn mount(&mut self, store: &AppStore, name: &str) {
        if self.panels.contains_key(name) {
            return;
        }
        match store.entry(name) {
            Some(entry) => {
                let panel = self.factory.create(entry);
                self.panels
                    .insert(name.to_string(), MountedPanel::mount(panel));
            }
            None => debug!("ViewSynchronizer: '{}' already left the store", name),
        }
    }

    fn show(&mut self, store: &AppStore, name: Option<String>) {
        if let Some(old) = self.visible.take() {
            if let Some(panel) = self.panels.get_mut(&old) {
                panel.deactivate();
            }
        }

        if let Some(name) = &name {
            self.mount(store, name);
        }

        self.visible = name.filter(|name| self.panels.contains_key(name));
        self.navigator.set_current(self.visible.as_deref());
        match self.visible.as_ref().and_then(|name| self.panels.get_mut(name)) {
            Some(panel) => panel.activate(),
            None => debug!("ViewSynchronizer: showing empty state"),
        }
    }

    /// Rebuild rows and panels from the store's current contents, discarding
    /// any pending events.
    pub fn reconcile(&mut self, store: &mut AppStore) {
        let discarded = store.drain_events().len();
        info!(
            "ViewSynchronizer: reconciling {} entries ({} pending events discarded)",
            store.len(),
            discarded
        );

        self.visible = None;
        self.panels.clear();
        self.navigator.clear();

        for (index, entry) in store.entries().iter().enumerate() {
            self.navigator
                .insert_row(index, NavigatorRow::new(entry.name(), entry.data().shape()));
            self.mount(store, entry.name());
        }
        self.state = SyncState::Idle;
        self.show(store, store.selected().map(str::to_string));
    }

    /// Whether rows, panels and the visible panel match the store
    pub fn is_consistent_with(&self, store: &AppStore) -> bool {
        self.navigator.names() == store.names()
            && self.panels.len() == store.len()
            && self.visible.as_deref() == store.selected()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    pub fn visible_name(&self) -> Option<&str> {
        self.visible.as_deref()
    }

    pub fn visible_panel(&self) -> Option<&F::Panel> {
        self.visible
            .as_ref()
            .and_then(|name| self.panels.get(name))
            .map(|mounted| &**mounted)
    }

    pub fn visible_panel_mut(&mut self) -> Option<&mut F::Panel> {
        match self.visible.as_ref() {
            Some(name) => self.panels.get_mut(name).map(|mounted| &mut **mounted),
            None => None,
        }
    }

    pub fn panel(&self, name: &str) -> Option<&F::Panel> {
        self.panels.get(name).map(|mounted| &**mounted)
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn event_history(&self) -> impl Iterator<Item = &StoreEvent> {
        self.event_history.iter()
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }
}
