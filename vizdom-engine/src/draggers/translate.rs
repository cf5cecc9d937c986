use vizdom_core::geometry::Ray;

use super::{DragContext, Dragger, DraggerState, horizontal_delta, translated};
use crate::primitives::Primitive;

/// 线与点只支持整体水平平移。
pub struct TranslateDragger {
    state: DraggerState,
}

impl TranslateDragger {
    pub fn new(state: DraggerState) -> Self {
        Self { state }
    }
}

impl Dragger for TranslateDragger {
    fn state(&self) -> &DraggerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DraggerState {
        &mut self.state
    }

    fn compute(&self, ray: &Ray, context: &DragContext) -> Option<Primitive> {
        let delta = horizontal_delta(self.state.props(), ray)?;
        Some(translated(self.state.original(), delta, context))
    }
}
