// Scripted in-memory session for engine tests.
//
// Nodes are registered under a locator; `find` returns the first attached
// node. Replacing a node detaches it, so later operations on the old
// reference report staleness, like a re-rendered DOM.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::locator::Locator;
use crate::session::{DriverError, ENTER_KEY, Session};
use crate::types::BoundingBox;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeElement {
    pub id: u64,
}

#[derive(Debug, Clone)]
pub struct NodeTemplate {
    pub displayed: bool,
    pub enabled: bool,
    pub rect: BoundingBox,
    pub text: String,
    /// Node only reports as displayed from this instant on
    pub visible_at: Option<Instant>,
}

impl Default for NodeTemplate {
    fn default() -> Self {
        NodeTemplate {
            displayed: true,
            enabled: true,
            rect: BoundingBox {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 20.0,
            },
            text: String::new(),
            visible_at: None,
        }
    }
}

impl NodeTemplate {
    pub fn text(text: &str) -> Self {
        NodeTemplate {
            text: text.to_string(),
            ..NodeTemplate::default()
        }
    }

    pub fn hidden() -> Self {
        NodeTemplate {
            displayed: false,
            ..NodeTemplate::default()
        }
    }

    pub fn disabled() -> Self {
        NodeTemplate {
            enabled: false,
            ..NodeTemplate::default()
        }
    }

    pub fn zero_sized() -> Self {
        NodeTemplate {
            rect: BoundingBox::default(),
            ..NodeTemplate::default()
        }
    }

    pub fn visible_after(delay: Duration) -> Self {
        NodeTemplate {
            visible_at: Some(Instant::now() + delay),
            ..NodeTemplate::default()
        }
    }
}

#[derive(Debug)]
struct Node {
    template: NodeTemplate,
    attached: bool,
    value: String,
}

type Hook = Box<dyn Fn(&mut Dom) + Send>;

#[derive(Default)]
pub struct Dom {
    next_id: u64,
    nodes: HashMap<u64, Node>,
    by_locator: HashMap<String, Vec<u64>>,
    /// Dispatches (click, clear) that detach-and-replace the target first
    replace_on_dispatch: HashMap<String, u32>,
    /// Locators whose every operation is a fatal driver failure
    fatal: Vec<String>,
    click_hooks: HashMap<String, Hook>,
    enter_hooks: HashMap<String, Hook>,
    nav_hooks: HashMap<String, Hook>,
    current_url: String,
    title: String,
    pub clicks: Vec<u64>,
    pub keys: Vec<(u64, String)>,
    pub finds: HashMap<String, u32>,
}

impl Dom {
    pub fn add(&mut self, locator: &Locator, template: NodeTemplate) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.nodes.insert(
            id,
            Node {
                template,
                attached: true,
                value: String::new(),
            },
        );
        self.by_locator.entry(locator.to_string()).or_default().push(id);
        id
    }

    /// Detach every node under the locator
    pub fn remove(&mut self, locator: &Locator) {
        if let Some(ids) = self.by_locator.remove(&locator.to_string()) {
            for id in ids {
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.attached = false;
                }
            }
        }
    }

    /// Detach the first node under the locator and insert an identical one
    pub fn replace(&mut self, locator: &Locator) -> Option<u64> {
        self.replace_key(&locator.to_string())
    }

    fn replace_key(&mut self, key: &str) -> Option<u64> {
        let old = *self.by_locator.get(key)?.first()?;
        let template = {
            let node = self.nodes.get_mut(&old)?;
            node.attached = false;
            node.template.clone()
        };
        self.next_id += 1;
        let new = self.next_id;
        self.nodes.insert(
            new,
            Node {
                template,
                attached: true,
                value: String::new(),
            },
        );
        if let Some(ids) = self.by_locator.get_mut(key) {
            ids[0] = new;
        }
        Some(new)
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }
}

pub struct FakeSession {
    pub dom: Mutex<Dom>,
    closed: Arc<AtomicBool>,
}

impl FakeSession {
    pub fn new() -> Self {
        FakeSession {
            dom: Mutex::new(Dom::default()),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that flips once the session is closed
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }

    pub fn add(&self, locator: &Locator, template: NodeTemplate) -> u64 {
        self.dom.lock().unwrap().add(locator, template)
    }

    pub fn remove(&self, locator: &Locator) {
        self.dom.lock().unwrap().remove(locator)
    }

    pub fn replace(&self, locator: &Locator) -> Option<u64> {
        self.dom.lock().unwrap().replace(locator)
    }

    pub fn replace_on_dispatch(&self, locator: &Locator, times: u32) {
        self.dom
            .lock()
            .unwrap()
            .replace_on_dispatch
            .insert(locator.to_string(), times);
    }

    pub fn fail_fatally(&self, locator: &Locator) {
        self.dom.lock().unwrap().fatal.push(locator.to_string());
    }

    pub fn on_click(&self, locator: &Locator, hook: impl Fn(&mut Dom) + Send + 'static) {
        self.dom
            .lock()
            .unwrap()
            .click_hooks
            .insert(locator.to_string(), Box::new(hook));
    }

    pub fn on_enter(&self, locator: &Locator, hook: impl Fn(&mut Dom) + Send + 'static) {
        self.dom
            .lock()
            .unwrap()
            .enter_hooks
            .insert(locator.to_string(), Box::new(hook));
    }

    pub fn on_navigate(&self, url: &str, hook: impl Fn(&mut Dom) + Send + 'static) {
        self.dom
            .lock()
            .unwrap()
            .nav_hooks
            .insert(url.to_string(), Box::new(hook));
    }

    pub fn clicks(&self) -> Vec<u64> {
        self.dom.lock().unwrap().clicks.clone()
    }

    pub fn keys(&self) -> Vec<(u64, String)> {
        self.dom.lock().unwrap().keys.clone()
    }

    pub fn value_of(&self, id: u64) -> String {
        self.dom.lock().unwrap().nodes[&id].value.clone()
    }

    pub fn find_count(&self, locator: &Locator) -> u32 {
        self.dom
            .lock()
            .unwrap()
            .finds
            .get(&locator.to_string())
            .copied()
            .unwrap_or(0)
    }

    fn locator_of(dom: &Dom, id: u64) -> Option<String> {
        dom.by_locator
            .iter()
            .find(|(_, ids)| ids.contains(&id))
            .map(|(key, _)| key.clone())
    }

    fn check_fatal(dom: &Dom, id: u64) -> Result<(), DriverError> {
        if let Some(key) = Self::locator_of(dom, id)
            && dom.fatal.contains(&key)
        {
            return Err(DriverError::Fatal(anyhow::anyhow!(
                "invalid session id while handling {}",
                key
            )));
        }
        Ok(())
    }

    /// Re-render detaches the node the dispatch was aimed at
    fn rerender_if_scripted(
        dom: &mut Dom,
        key: &str,
        element: &FakeElement,
    ) -> Result<(), DriverError> {
        if let Some(remaining) = dom.replace_on_dispatch.get_mut(key)
            && *remaining > 0
        {
            *remaining -= 1;
            dom.replace_key(key);
            return Err(DriverError::Stale(format!("node {}", element.id)));
        }
        Ok(())
    }

    /// Run `f` against an attached node or report staleness
    fn with_node<T>(
        &self,
        element: &FakeElement,
        f: impl FnOnce(&mut Node) -> T,
    ) -> Result<T, DriverError> {
        let mut dom = self.dom.lock().unwrap();
        Self::check_fatal(&dom, element.id)?;
        match dom.nodes.get_mut(&element.id) {
            Some(node) if node.attached => Ok(f(node)),
            _ => Err(DriverError::Stale(format!("node {}", element.id))),
        }
    }
}

impl Session for FakeSession {
    type Element = FakeElement;

    async fn find(&self, locator: &Locator) -> Result<FakeElement, DriverError> {
        let mut dom = self.dom.lock().unwrap();
        let key = locator.to_string();
        *dom.finds.entry(key.clone()).or_default() += 1;
        if dom.fatal.contains(&key) {
            return Err(DriverError::Fatal(anyhow::anyhow!(
                "invalid session id while finding {}",
                key
            )));
        }
        dom.by_locator
            .get(&key)
            .and_then(|ids| ids.first())
            .map(|id| FakeElement { id: *id })
            .ok_or(DriverError::NoSuchElement(key))
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<FakeElement>, DriverError> {
        let dom = self.dom.lock().unwrap();
        Ok(dom
            .by_locator
            .get(&locator.to_string())
            .map(|ids| ids.iter().map(|id| FakeElement { id: *id }).collect())
            .unwrap_or_default())
    }

    async fn is_displayed(&self, element: &FakeElement) -> Result<bool, DriverError> {
        self.with_node(element, |node| {
            node.template.displayed
                && node
                    .template
                    .visible_at
                    .is_none_or(|at| Instant::now() >= at)
        })
    }

    async fn is_enabled(&self, element: &FakeElement) -> Result<bool, DriverError> {
        self.with_node(element, |node| node.template.enabled)
    }

    async fn bounding_box(&self, element: &FakeElement) -> Result<BoundingBox, DriverError> {
        self.with_node(element, |node| node.template.rect)
    }

    async fn text(&self, element: &FakeElement) -> Result<String, DriverError> {
        self.with_node(element, |node| node.template.text.clone())
    }

    async fn click(&self, element: &FakeElement) -> Result<(), DriverError> {
        let mut dom = self.dom.lock().unwrap();
        Self::check_fatal(&dom, element.id)?;
        let attached = dom.nodes.get(&element.id).is_some_and(|n| n.attached);
        if !attached {
            return Err(DriverError::Stale(format!("node {}", element.id)));
        }
        let key = Self::locator_of(&dom, element.id).unwrap_or_default();
        Self::rerender_if_scripted(&mut dom, &key, element)?;
        let enabled = dom.nodes[&element.id].template.enabled;
        if !enabled {
            return Err(DriverError::NotInteractable(format!(
                "node {} is disabled",
                element.id
            )));
        }
        dom.clicks.push(element.id);
        if let Some(hook) = dom.click_hooks.remove(&key) {
            hook(&mut dom);
            dom.click_hooks.insert(key, hook);
        }
        Ok(())
    }

    async fn clear(&self, element: &FakeElement) -> Result<(), DriverError> {
        {
            let mut dom = self.dom.lock().unwrap();
            if let Some(key) = Self::locator_of(&dom, element.id) {
                Self::rerender_if_scripted(&mut dom, &key, element)?;
            }
        }
        self.with_node(element, |node| node.value.clear())
    }

    async fn send_keys(&self, element: &FakeElement, text: &str) -> Result<(), DriverError> {
        self.with_node(element, |node| node.value.push_str(text))?;
        let mut dom = self.dom.lock().unwrap();
        dom.keys.push((element.id, text.to_string()));
        if text.contains(ENTER_KEY)
            && let Some(key) = Self::locator_of(&dom, element.id)
            && let Some(hook) = dom.enter_hooks.remove(&key)
        {
            hook(&mut dom);
            dom.enter_hooks.insert(key, hook);
        }
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        let mut dom = self.dom.lock().unwrap();
        dom.current_url = url.to_string();
        if let Some(hook) = dom.nav_hooks.remove(url) {
            hook(&mut dom);
            dom.nav_hooks.insert(url.to_string(), hook);
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.dom.lock().unwrap().current_url.clone())
    }

    async fn title(&self) -> Result<String, DriverError> {
        Ok(self.dom.lock().unwrap().title.clone())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        // PNG signature is enough for the capture path
        Ok(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
    }

    async fn close(self) -> Result<(), DriverError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
