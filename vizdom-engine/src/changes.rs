/// 变更令牌。集合是封闭的，视图与监听器依据它决定要刷新什么。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    VisibleState,
    Active,
    Selected,
    Expanded,
    Focus,
    Clipping,
    Naming,
    Color,
    Icon,
    RenderStyle,
    Unit,
    Geometry,
    Dragging,
    PartChanged,
    PartAdded,
    PartDeleted,
    Added,
    Deleting,
    Deleted,
    ChildAdded,
    ChildDeleted,
    Loaded,
}

impl Change {
    pub const ALL: [Change; 22] = [
        Change::VisibleState,
        Change::Active,
        Change::Selected,
        Change::Expanded,
        Change::Focus,
        Change::Clipping,
        Change::Naming,
        Change::Color,
        Change::Icon,
        Change::RenderStyle,
        Change::Unit,
        Change::Geometry,
        Change::Dragging,
        Change::PartChanged,
        Change::PartAdded,
        Change::PartDeleted,
        Change::Added,
        Change::Deleting,
        Change::Deleted,
        Change::ChildAdded,
        Change::ChildDeleted,
        Change::Loaded,
    ];
}

/// 单个变更及其可选的字段说明（例如渲染样式里具体改了哪个属性）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedDescription {
    pub change: Change,
    pub field_name: Option<String>,
}

impl ChangedDescription {
    pub fn new(change: Change) -> Self {
        Self {
            change,
            field_name: None,
        }
    }

    pub fn with_field(change: Change, field_name: impl Into<String>) -> Self {
        Self {
            change,
            field_name: Some(field_name.into()),
        }
    }
}

/// 一次通知携带的变更集合。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainObjectChange {
    descriptions: Vec<ChangedDescription>,
}

impl DomainObjectChange {
    pub fn new(change: Change) -> Self {
        Self {
            descriptions: vec![ChangedDescription::new(change)],
        }
    }

    pub fn from_description(description: ChangedDescription) -> Self {
        Self {
            descriptions: vec![description],
        }
    }

    /// 追加一个变更；同一令牌重复添加时保留第一次的描述。
    pub fn add(&mut self, change: Change) -> &mut Self {
        self.add_description(ChangedDescription::new(change))
    }

    pub fn add_description(&mut self, description: ChangedDescription) -> &mut Self {
        if !self.contains(description.change) {
            self.descriptions.push(description);
        }
        self
    }

    pub fn with(mut self, change: Change) -> Self {
        self.add(change);
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }

    #[inline]
    fn contains(&self, change: Change) -> bool {
        self.descriptions.iter().any(|desc| desc.change == change)
    }

    /// 与查询集合有交集时返回 true。
    pub fn is_changed(&self, changes: &[Change]) -> bool {
        changes.iter().any(|change| self.contains(*change))
    }

    /// 指定变更带有给定字段名之一时返回 true。
    pub fn is_name_changed(&self, change: Change, field_names: &[&str]) -> bool {
        self.description(change)
            .and_then(|desc| desc.field_name.as_deref())
            .is_some_and(|name| field_names.contains(&name))
    }

    pub fn description(&self, change: Change) -> Option<&ChangedDescription> {
        self.descriptions.iter().find(|desc| desc.change == change)
    }

    pub fn changes(&self) -> impl Iterator<Item = Change> + '_ {
        self.descriptions.iter().map(|desc| desc.change)
    }
}

impl From<Change> for DomainObjectChange {
    fn from(change: Change) -> Self {
        Self::new(change)
    }
}

impl From<ChangedDescription> for DomainObjectChange {
    fn from(description: ChangedDescription) -> Self {
        Self::from_description(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_changed_checks_intersection() {
        let change = DomainObjectChange::new(Change::Focus).with(Change::Geometry);
        assert!(change.is_changed(&[Change::Geometry]));
        assert!(change.is_changed(&[Change::Color, Change::Focus]));
        assert!(!change.is_changed(&[Change::Color, Change::Naming]));
        assert!(!change.is_changed(&[]));
    }

    #[test]
    fn duplicate_tokens_are_collapsed() {
        let mut change = DomainObjectChange::from(ChangedDescription::with_field(
            Change::RenderStyle,
            "opacity",
        ));
        change.add(Change::RenderStyle);
        assert_eq!(change.changes().count(), 1);
        assert!(change.is_name_changed(Change::RenderStyle, &["opacity", "depth_test"]));
        assert!(!change.is_name_changed(Change::RenderStyle, &["line_width"]));
    }

    #[test]
    fn all_tokens_are_distinct() {
        for (index, change) in Change::ALL.iter().enumerate() {
            assert!(!Change::ALL[index + 1..].contains(change));
        }
    }
}
