use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use vizdom_core::colors::Color;

use crate::changes::{Change, DomainObjectChange};
use crate::observable::{Disposable, Observable};
use crate::primitives::{BoxFace, Primitive, PrimitiveType};
use crate::style::RenderStyle;
use crate::views::{ListenerId, Views};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// 进程内唯一的对象标识，构造时分配，整个生命周期不变。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainObjectId(u64);

impl DomainObjectId {
    pub(crate) fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for DomainObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 焦点状态。`Pending` 只在创建过程中出现，离开后不会再回到该状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FocusType {
    #[default]
    None,
    Focus,
    Face,
    Corner,
    Rotation,
    Body,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibleState {
    All,
    Some,
    None,
    Disabled,
    CanNotBeVisibleNow,
}

/// 对象种类。所有“虚方法”都通过对它的 `match` 分派。
#[derive(Debug, Clone, PartialEq)]
pub enum DomainKind {
    Root,
    Folder { is_render_style_root: bool },
    Primitive(Primitive),
}

/// 按类型检索后代时使用的过滤条件。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainType {
    Root,
    Folder,
    Primitive,
    PrimitiveOf(PrimitiveType),
    Plane,
    Line,
    Solid,
}

impl DomainType {
    pub fn matches(self, kind: &DomainKind) -> bool {
        match (self, kind) {
            (DomainType::Root, DomainKind::Root) => true,
            (DomainType::Folder, DomainKind::Folder { .. }) => true,
            (DomainType::Primitive, DomainKind::Primitive(_)) => true,
            (DomainType::PrimitiveOf(kind), DomainKind::Primitive(primitive)) => {
                primitive.primitive_type() == kind
            }
            (DomainType::Plane, DomainKind::Primitive(primitive)) => {
                primitive.primitive_type().is_plane()
            }
            (DomainType::Line, DomainKind::Primitive(primitive)) => {
                primitive.primitive_type().is_line()
            }
            (DomainType::Solid, DomainKind::Primitive(primitive)) => {
                primitive.primitive_type().is_solid()
            }
            _ => false,
        }
    }
}

/// 场景树上的节点。父子关系只以 id 记录，由 `Scene` 统一维护。
pub struct DomainObject {
    pub(crate) id: DomainObjectId,
    pub(crate) parent: Option<DomainObjectId>,
    pub(crate) children: Vec<DomainObjectId>,
    pub(crate) kind: DomainKind,
    pub(crate) name: Option<String>,
    pub(crate) color: Option<Color>,
    pub(crate) is_selected: bool,
    pub(crate) is_active: bool,
    pub(crate) is_expanded: bool,
    pub(crate) focus_type: FocusType,
    pub(crate) focus_face: Option<BoxFace>,
    pub(crate) render_style: Option<RenderStyle>,
    pub(crate) views: Views,
    pub(crate) disposables: Vec<Disposable>,
    pub(crate) is_disposed: bool,
}

impl DomainObject {
    pub fn new(kind: DomainKind) -> Self {
        Self {
            id: DomainObjectId::next(),
            parent: None,
            children: Vec::new(),
            kind,
            name: None,
            color: None,
            is_selected: false,
            is_active: false,
            is_expanded: false,
            focus_type: FocusType::None,
            focus_face: None,
            render_style: None,
            views: Views::default(),
            disposables: Vec::new(),
            is_disposed: false,
        }
    }

    pub fn folder() -> Self {
        Self::new(DomainKind::Folder {
            is_render_style_root: false,
        })
    }

    pub fn primitive(primitive: Primitive) -> Self {
        Self::new(DomainKind::Primitive(primitive))
    }

    #[inline]
    pub fn id(&self) -> DomainObjectId {
        self.id
    }

    #[inline]
    pub fn parent(&self) -> Option<DomainObjectId> {
        self.parent
    }

    #[inline]
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    #[inline]
    pub fn children(&self) -> &[DomainObjectId] {
        &self.children
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub fn kind(&self) -> &DomainKind {
        &self.kind
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match &self.kind {
            DomainKind::Primitive(primitive) => Some(primitive),
            _ => None,
        }
    }

    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        self.as_primitive().map(Primitive::primitive_type)
    }

    /// 替换几何；种类必须一致，否则不做任何修改。
    pub fn set_primitive(&mut self, primitive: Primitive) -> bool {
        match &mut self.kind {
            DomainKind::Primitive(current)
                if current.primitive_type() == primitive.primitive_type() =>
            {
                *current = primitive;
                true
            }
            _ => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            DomainKind::Root => "Root",
            DomainKind::Folder { .. } => "Folder",
            DomainKind::Primitive(primitive) => primitive.primitive_type().type_name(),
        }
    }

    /// 显示名；尚未命名时退化为类型名。
    pub fn name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self.type_name(),
        }
    }

    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|name| !name.is_empty())
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn has_equal_name(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name)
    }

    pub fn color(&self) -> Color {
        self.color.unwrap_or(Color::WHITE)
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = Some(color);
    }

    #[inline]
    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.is_expanded
    }

    #[inline]
    pub fn focus_type(&self) -> FocusType {
        self.focus_type
    }

    #[inline]
    pub fn focus_face(&self) -> Option<BoxFace> {
        self.focus_face
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.is_disposed
    }

    pub fn own_render_style(&self) -> Option<&RenderStyle> {
        self.render_style.as_ref()
    }

    pub fn set_render_style(&mut self, style: Option<RenderStyle>) {
        self.render_style = style;
    }

    #[inline]
    pub fn views(&self) -> &Views {
        &self.views
    }

    #[inline]
    pub fn views_mut(&mut self) -> &mut Views {
        &mut self.views
    }

    pub fn add_event_listener(
        &mut self,
        listener: impl FnMut(&DomainObject, &DomainObjectChange) + 'static,
    ) -> ListenerId {
        self.views.add_event_listener(listener)
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.views.remove_event_listener(id)
    }

    pub fn can_be_removed(&self) -> bool {
        !matches!(self.kind, DomainKind::Root)
    }

    pub fn can_change_name(&self) -> bool {
        !matches!(self.kind, DomainKind::Root)
    }

    pub fn can_change_color(&self) -> bool {
        matches!(self.kind, DomainKind::Primitive(_))
    }

    pub fn can_be_selected(&self) -> bool {
        matches!(self.kind, DomainKind::Primitive(_))
    }

    /// 只有剖切平面支持“激活”。
    pub fn can_be_active(&self) -> bool {
        self.primitive_type().is_some_and(PrimitiveType::is_plane)
    }

    pub fn can_be_expanded(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn can_create_view(&self) -> bool {
        matches!(self.kind, DomainKind::Primitive(_))
    }

    pub fn has_panel_info(&self) -> bool {
        matches!(self.kind, DomainKind::Primitive(_))
    }

    pub fn is_render_style_root(&self) -> bool {
        matches!(
            self.kind,
            DomainKind::Folder {
                is_render_style_root: true
            }
        )
    }

    /// 创建中（`Pending`）的图元不合法：不能显示、不能选中、不参与剖切。
    pub fn is_legal(&self) -> bool {
        match self.kind {
            DomainKind::Primitive(_) => self.focus_type != FocusType::Pending,
            _ => true,
        }
    }

    pub fn can_be_set_visible_now(&self) -> bool {
        self.is_legal()
    }

    pub(crate) fn create_render_style(&self) -> Option<RenderStyle> {
        match &self.kind {
            DomainKind::Root => None,
            DomainKind::Folder {
                is_render_style_root,
            } => is_render_style_root.then(RenderStyle::default),
            DomainKind::Primitive(primitive) => {
                Some(RenderStyle::for_primitive(primitive.primitive_type()))
            }
        }
    }

    /// 从另一个对象复制字段。`what == None` 复制全部（包括 id），
    /// 否则只复制该变更类型所拥有的字段。树关系与视图从不复制。
    pub fn copy_from(&mut self, other: &DomainObject, what: Option<Change>) {
        match what {
            None => {
                self.id = other.id;
                self.kind = other.kind.clone();
                self.name = other.name.clone();
                self.color = other.color;
                self.render_style = other.render_style.clone();
                self.is_selected = other.is_selected;
                self.is_active = other.is_active;
                self.is_expanded = other.is_expanded;
                self.focus_type = other.focus_type;
                self.focus_face = other.focus_face;
            }
            Some(Change::Geometry) => {
                if let (DomainKind::Primitive(mine), DomainKind::Primitive(theirs)) =
                    (&mut self.kind, &other.kind)
                {
                    if mine.primitive_type() == theirs.primitive_type() {
                        *mine = theirs.clone();
                    }
                }
            }
            Some(Change::Color) => self.color = other.color,
            Some(Change::Naming) => self.name = other.name.clone(),
            Some(Change::RenderStyle) => self.render_style = other.render_style.clone(),
            Some(Change::Selected) => self.is_selected = other.is_selected,
            Some(Change::Active) => self.is_active = other.is_active,
            Some(Change::Expanded) => self.is_expanded = other.is_expanded,
            Some(Change::Focus) => {
                self.focus_type = other.focus_type;
                self.focus_face = other.focus_face;
            }
            Some(_) => {}
        }
    }

    /// 复制出一个游离的新对象（无父子、无视图、无监听器）。
    pub fn clone_object(&self, what: Option<Change>) -> DomainObject {
        let kind = match &self.kind {
            DomainKind::Root => DomainKind::Root,
            DomainKind::Folder {
                is_render_style_root,
            } => DomainKind::Folder {
                is_render_style_root: *is_render_style_root,
            },
            DomainKind::Primitive(primitive) => {
                DomainKind::Primitive(Primitive::new(primitive.primitive_type()))
            }
        };
        let mut clone = DomainObject::new(kind);
        clone.copy_from(self, what);
        clone
    }

    pub fn add_disposable(&mut self, disposable: Disposable) {
        if self.is_disposed {
            disposable();
            return;
        }
        self.disposables.push(disposable);
    }

    /// 订阅信号，并在对象销毁时自动退订。
    pub fn add_effect<T: Clone + PartialEq + 'static>(
        &mut self,
        observable: &Observable<T>,
        callback: impl FnMut(&T) + 'static,
    ) {
        let subscription = observable.subscribe(callback);
        self.add_disposable(subscription.into_disposable());
    }

    /// 释放视图、监听器与清理回调；重复调用无副作用。
    pub fn dispose(&mut self) {
        if self.is_disposed {
            return;
        }
        self.is_disposed = true;
        self.views.clear();
        for disposable in self.disposables.drain(..) {
            disposable();
        }
    }
}

impl std::fmt::Debug for DomainObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainObject")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("focus_type", &self.focus_type)
            .field("is_selected", &self.is_selected)
            .field("views", &self.views)
            .field("is_disposed", &self.is_disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use glam::DVec3;

    use super::*;

    fn sample_box() -> DomainObject {
        let mut object = DomainObject::primitive(Primitive::new_box(
            DVec3::new(1.0, 2.0, 3.0),
            DVec3::new(4.0, 5.0, 6.0),
            0.5,
        ));
        object.set_name("Box A");
        object.set_color(Color::new(0.1, 0.2, 0.3));
        object.render_style = object.create_render_style();
        object.is_selected = true;
        object.focus_type = FocusType::Face;
        object.focus_face = Some(BoxFace::new(2));
        object
    }

    #[test]
    fn full_clone_keeps_identity_and_fields() {
        let original = sample_box();
        let clone = original.clone_object(None);
        assert_eq!(clone.id(), original.id());
        assert_eq!(clone.kind(), original.kind());
        assert_eq!(clone.name(), "Box A");
        assert_eq!(clone.color(), original.color());
        assert_eq!(clone.own_render_style(), original.own_render_style());
        assert!(clone.is_selected());
        assert_eq!(clone.focus_face(), Some(BoxFace::new(2)));
        assert!(clone.parent().is_none());
        assert!(clone.views().is_empty());
    }

    #[test]
    fn clone_does_not_share_line_points() {
        let original = DomainObject::primitive(
            Primitive::with_shape(
                PrimitiveType::Polyline,
                crate::primitives::Shape::Line(vec![DVec3::ZERO, DVec3::X]),
            )
            .expect("polyline shape"),
        );
        let mut clone = original.clone_object(None);
        let mut changed = clone.as_primitive().cloned().expect("primitive");
        changed.translate(DVec3::Z);
        assert!(clone.set_primitive(changed));
        let original_points = original
            .as_primitive()
            .and_then(Primitive::as_line)
            .expect("line points");
        assert!(original_points[1].abs_diff_eq(DVec3::X, 1e-12));
    }

    #[test]
    fn partial_clone_only_copies_owned_fields() {
        let original = sample_box();
        let geometry = original.clone_object(Some(Change::Geometry));
        assert_ne!(geometry.id(), original.id());
        assert_eq!(geometry.kind(), original.kind());
        assert!(!geometry.has_name());
        assert!(geometry.color.is_none());

        let color = original.clone_object(Some(Change::Color));
        assert_eq!(color.color(), original.color());
        assert_eq!(
            color.as_primitive().map(|p| p.geometry_eq(&Primitive::new(PrimitiveType::Box), 1e-12)),
            Some(true)
        );
    }

    #[test]
    fn pending_primitives_are_not_legal() {
        let mut object = DomainObject::primitive(Primitive::new(PrimitiveType::Point));
        assert!(object.is_legal());
        object.focus_type = FocusType::Pending;
        assert!(!object.is_legal());
        assert!(!object.can_be_set_visible_now());
        assert!(DomainObject::folder().is_legal());
    }

    #[test]
    fn dispose_runs_disposables_once_and_unsubscribes_effects() {
        let mut object = DomainObject::folder();
        let disposed = Rc::new(Cell::new(0));
        let counter = Rc::clone(&disposed);
        object.add_disposable(Box::new(move || counter.set(counter.get() + 1)));

        let signal = Observable::new(0);
        let seen = Rc::new(Cell::new(0));
        let effect_counter = Rc::clone(&seen);
        object.add_effect(&signal, move |value| effect_counter.set(*value));
        signal.set(7);
        assert_eq!(seen.get(), 7);

        object.dispose();
        object.dispose();
        assert_eq!(disposed.get(), 1);
        assert!(object.is_disposed());

        signal.set(9);
        assert_eq!(seen.get(), 7);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn domain_type_filters() {
        let plane = DomainKind::Primitive(Primitive::new(PrimitiveType::PlaneZ));
        assert!(DomainType::Plane.matches(&plane));
        assert!(DomainType::Primitive.matches(&plane));
        assert!(DomainType::PrimitiveOf(PrimitiveType::PlaneZ).matches(&plane));
        assert!(!DomainType::PrimitiveOf(PrimitiveType::PlaneX).matches(&plane));
        assert!(!DomainType::Solid.matches(&plane));
        assert!(DomainType::Root.matches(&DomainKind::Root));
    }
}
