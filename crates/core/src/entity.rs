//! Entity trait: identity that survives state changes (a Reception stays the
//! same Reception after it is closed).

pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
