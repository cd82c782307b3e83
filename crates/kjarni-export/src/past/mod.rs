//! Past key/value layouts for encoder-decoder export.
//!
//! A decoder's forward pass hands back its present states grouped by layer:
//!
//! ```text
//! (key_self_0, value_self_0, key_cross_0, value_cross_0),
//! (key_self_1, value_self_1, key_cross_1, value_cross_1), ...
//! ```
//!
//! The exported graph binds them grouped by attention type instead:
//!
//! ```text
//! key_self_0, value_self_0, key_self_1, value_self_1, ...,
//! key_cross_0, value_cross_0, key_cross_1, value_cross_1, ...
//! ```
//!
//! [`group_by_self_and_cross`] and [`back_group_by_layer`] convert between
//! the two. States are opaque here; any `Clone` tensor type works.

mod placeholder;

pub use placeholder::{dummy_past, PastShape};

use crate::error::{ExportError, ExportResult};

/// Number of states one decoder layer contributes.
pub const STATES_PER_LAYER: usize = 4;

/// Present (or past) states of a single decoder layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerGroup<T> {
    pub self_key: T,
    pub self_value: T,
    pub cross_key: T,
    pub cross_value: T,
}

impl<T> LayerGroup<T> {
    pub fn new(self_key: T, self_value: T, cross_key: T, cross_value: T) -> Self {
        Self {
            self_key,
            self_value,
            cross_key,
            cross_value,
        }
    }

    /// Checks the four-state contract for layer `layer`.
    pub fn try_from_vec(layer: usize, states: Vec<T>) -> ExportResult<Self> {
        let len = states.len();
        let mut it = states.into_iter();
        match (it.next(), it.next(), it.next(), it.next(), it.next()) {
            (Some(sk), Some(sv), Some(ck), Some(cv), None) => Ok(Self::new(sk, sv, ck, cv)),
            _ => Err(ExportError::ContractViolation { layer, len }),
        }
    }

    /// Layer order: self key, self value, cross key, cross value.
    pub fn into_vec(self) -> Vec<T> {
        vec![self.self_key, self.self_value, self.cross_key, self.cross_value]
    }

    pub fn self_attn(&self) -> (&T, &T) {
        (&self.self_key, &self.self_value)
    }

    pub fn cross_attn(&self) -> (&T, &T) {
        (&self.cross_key, &self.cross_value)
    }
}

impl<T: Clone> LayerGroup<T> {
    pub fn try_from_slice(layer: usize, states: &[T]) -> ExportResult<Self> {
        match states {
            [sk, sv, ck, cv] => Ok(Self::new(sk.clone(), sv.clone(), ck.clone(), cv.clone())),
            _ => Err(ExportError::ContractViolation {
                layer,
                len: states.len(),
            }),
        }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.clone().into_vec()
    }
}

impl<T> TryFrom<Vec<T>> for LayerGroup<T> {
    type Error = ExportError;

    fn try_from(states: Vec<T>) -> ExportResult<Self> {
        Self::try_from_vec(0, states)
    }
}

/// Result of regrouping by attention type.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupedPresent<T> {
    Split { self_attn: Vec<T>, cross_attn: Vec<T> },
    /// Self-attention block followed by the cross-attention block.
    Concat(Vec<T>),
}

impl<T> GroupedPresent<T> {
    pub fn into_flat(self) -> Vec<T> {
        match self {
            Self::Split {
                mut self_attn,
                cross_attn,
            } => {
                self_attn.extend(cross_attn);
                self_attn
            }
            Self::Concat(all) => all,
        }
    }

    /// Splits a concatenated result at its midpoint.
    pub fn into_split(self) -> (Vec<T>, Vec<T>) {
        match self {
            Self::Split {
                self_attn,
                cross_attn,
            } => (self_attn, cross_attn),
            Self::Concat(mut all) => {
                let cross = all.split_off(all.len() / 2);
                (all, cross)
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Split {
                self_attn,
                cross_attn,
            } => self_attn.len() + cross_attn.len(),
            Self::Concat(all) => all.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits per-layer present states into self-attention and cross-attention blocks.
///
/// Every layer must hold exactly four states; the first layer that does not
/// fails with [`ExportError::ContractViolation`]. With `concat` set the two
/// blocks come back as one sequence, self block first.
pub fn group_by_self_and_cross<T: Clone>(
    present_key_values: &[Vec<T>],
    concat: bool,
) -> ExportResult<GroupedPresent<T>> {
    let layers = present_key_values
        .iter()
        .enumerate()
        .map(|(i, layer)| LayerGroup::try_from_slice(i, layer))
        .collect::<ExportResult<Vec<_>>>()?;

    Ok(group_layers(layers, concat))
}

/// Same as [`group_by_self_and_cross`] for layers that are already typed.
pub fn group_layers<T>(
    layers: impl IntoIterator<Item = LayerGroup<T>>,
    concat: bool,
) -> GroupedPresent<T> {
    let layers = layers.into_iter();
    let (lower, _) = layers.size_hint();
    let mut self_attn = Vec::with_capacity(2 * lower);
    let mut cross_attn = Vec::with_capacity(2 * lower);

    for layer in layers {
        self_attn.push(layer.self_key);
        self_attn.push(layer.self_value);
        cross_attn.push(layer.cross_key);
        cross_attn.push(layer.cross_value);
    }

    if concat {
        self_attn.extend(cross_attn);
        GroupedPresent::Concat(self_attn)
    } else {
        GroupedPresent::Split {
            self_attn,
            cross_attn,
        }
    }
}

/// Regroups a flat self-then-cross sequence back into per-layer groups.
///
/// The number of layers is `len / 4`, rounded down. Trailing states that do
/// not fill a whole layer are dropped without error.
pub fn back_group_by_layer<T: Clone>(past_key_values: &[T]) -> Vec<LayerGroup<T>> {
    let half = past_key_values.len() / 2;
    let num_layers = past_key_values.len() / STATES_PER_LAYER;

    let dropped = past_key_values.len() % STATES_PER_LAYER;
    if dropped != 0 {
        log::debug!(
            "back_group_by_layer: {} states do not fill a layer, dropping {}",
            past_key_values.len(),
            dropped
        );
    }

    (0..num_layers)
        .map(|i| {
            let idx = 2 * i;
            LayerGroup::new(
                past_key_values[idx].clone(),
                past_key_values[idx + 1].clone(),
                past_key_values[half + idx].clone(),
                past_key_values[half + idx + 1].clone(),
            )
        })
        .collect()
}
