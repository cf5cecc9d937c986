use std::any::Any;

use crate::changes::DomainObjectChange;
use crate::domain::DomainObject;
use crate::render::RenderTargetId;

/// 领域对象的外部表现（网格、标签、面板等）。视图只拿到只读引用，
/// 因此在 `update` 中无法回头修改场景树。
pub trait View: Any {
    /// 视图所属的渲染目标；非渲染类视图返回 `None`。
    fn target(&self) -> Option<RenderTargetId> {
        None
    }

    fn attach(&mut self, _object: &DomainObject) {}

    fn initialize(&mut self) {}

    fn on_show(&mut self) {}

    fn update(&mut self, object: &DomainObject, change: &DomainObjectChange);

    fn dispose(&mut self) {}

    fn as_any(&self) -> &dyn Any;
}

pub type EventListener = Box<dyn FnMut(&DomainObject, &DomainObjectChange)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// 对象上挂载的视图与事件监听器。通知顺序：先视图（按挂载顺序），后监听器。
#[derive(Default)]
pub struct Views {
    views: Vec<Box<dyn View>>,
    listeners: Vec<(ListenerId, EventListener)>,
    next_listener: u64,
}

impl Views {
    #[inline]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    #[inline]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn add_view(&mut self, view: Box<dyn View>) {
        self.views.push(view);
    }

    /// 移除并释放指定渲染目标的视图。
    pub fn remove_view(&mut self, target: RenderTargetId) -> bool {
        match self
            .views
            .iter()
            .position(|view| view.target() == Some(target))
        {
            Some(index) => {
                let mut view = self.views.remove(index);
                view.dispose();
                true
            }
            None => false,
        }
    }

    pub fn get_by_type<T: View>(&self) -> Option<&T> {
        self.views
            .iter()
            .find_map(|view| view.as_any().downcast_ref::<T>())
    }

    pub fn get_by_target(&self, target: RenderTargetId) -> Option<&dyn View> {
        self.views
            .iter()
            .find(|view| view.target() == Some(target))
            .map(|view| view.as_ref())
    }

    pub fn has_view_for(&self, target: RenderTargetId) -> bool {
        self.get_by_target(target).is_some()
    }

    pub fn add_event_listener(
        &mut self,
        listener: impl FnMut(&DomainObject, &DomainObjectChange) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    pub fn notify(&mut self, object: &DomainObject, change: &DomainObjectChange) {
        for view in &mut self.views {
            view.update(object, change);
        }
        for (_, listener) in &mut self.listeners {
            listener(object, change);
        }
    }

    /// 释放全部视图并清空监听器。
    pub fn clear(&mut self) {
        for mut view in self.views.drain(..) {
            view.dispose();
        }
        self.listeners.clear();
    }
}

impl std::fmt::Debug for Views {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Views")
            .field("views", &self.views.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
