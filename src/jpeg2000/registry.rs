//! Per tile-component parameter values.
//!
//! Most coding parameters of a JPEG 2000 codestream can be given once for the
//! whole image and then overridden for a tile, a component, or a single
//! tile-component. [`TileCompValue`] stores a parameter at those four
//! precedence levels and resolves the effective value for a `(tile, component)`
//! pair in the order tile-component, tile default, component default, default.
//!
//! Option strings use the index syntax `[t<idx>] [c<idx>] value ...`, where
//! `<idx>` is a comma separated list of indices or inclusive ranges, e.g.
//! `"5 t0,2-3 3 c1 4"`.

use std::collections::HashMap;

use crate::error::{AnalysisError, Result};

/// Which kinds of specific values a parameter accepts besides its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueScope {
    /// Tile defaults only (e.g. the component transform, which spans components).
    Tile,
    /// Component defaults only.
    Component,
    /// Tile defaults, component defaults and tile-component values.
    TileComponent,
}

impl ValueScope {
    fn allows_tile(self) -> bool {
        matches!(self, ValueScope::Tile | ValueScope::TileComponent)
    }

    fn allows_component(self) -> bool {
        matches!(self, ValueScope::Component | ValueScope::TileComponent)
    }
}

/// The precedence level a resolved value came from, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValueKind {
    Default,
    ComponentDefault,
    TileDefault,
    TileComponent,
}

/// A parameter value attachable at default, tile, component and tile-component level.
#[derive(Debug, Clone)]
pub struct TileCompValue<T> {
    name: &'static str,
    scope: ValueScope,
    num_tiles: usize,
    num_components: usize,
    default: Option<T>,
    tile_defaults: Vec<Option<T>>,
    component_defaults: Vec<Option<T>>,
    tile_component: HashMap<(usize, usize), T>,
}

impl<T> TileCompValue<T> {
    /// Creates an empty value for an image with the given tile and component counts.
    ///
    /// `name` is used in error messages.
    pub fn new(name: &'static str, scope: ValueScope, num_tiles: usize, num_components: usize) -> Self {
        Self {
            name,
            scope,
            num_tiles,
            num_components,
            default: None,
            tile_defaults: (0..num_tiles).map(|_| None).collect(),
            component_defaults: (0..num_components).map(|_| None).collect(),
            tile_component: HashMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn scope(&self) -> ValueScope {
        self.scope
    }

    pub fn num_tiles(&self) -> usize {
        self.num_tiles
    }

    pub fn num_components(&self) -> usize {
        self.num_components
    }

    pub fn set_default(&mut self, value: T) {
        self.default = Some(value);
    }

    pub fn default_value(&self) -> Option<&T> {
        self.default.as_ref()
    }

    pub fn set_tile_default(&mut self, tile: usize, value: T) -> Result<()> {
        if !self.scope.allows_tile() {
            return Err(self.scope_error("tile"));
        }
        self.check_tile(tile)?;
        self.tile_defaults[tile] = Some(value);
        Ok(())
    }

    pub fn set_component_default(&mut self, component: usize, value: T) -> Result<()> {
        if !self.scope.allows_component() {
            return Err(self.scope_error("component"));
        }
        self.check_component(component)?;
        self.component_defaults[component] = Some(value);
        Ok(())
    }

    pub fn set_tile_component(&mut self, tile: usize, component: usize, value: T) -> Result<()> {
        if self.scope != ValueScope::TileComponent {
            return Err(self.scope_error("tile-component"));
        }
        self.check_tile(tile)?;
        self.check_component(component)?;
        self.tile_component.insert((tile, component), value);
        Ok(())
    }

    /// Returns the effective value for `(tile, component)`.
    ///
    /// Fails when no level applies, which can only happen if the default was
    /// never set.
    pub fn resolve(&self, tile: usize, component: usize) -> Result<&T> {
        self.check_tile(tile)?;
        self.check_component(component)?;
        self.tile_component
            .get(&(tile, component))
            .or(self.tile_defaults[tile].as_ref())
            .or(self.component_defaults[component].as_ref())
            .or(self.default.as_ref())
            .ok_or(AnalysisError::MissingDefault(self.name))
    }

    /// Returns the effective value of a tile-scoped parameter.
    pub fn resolve_tile(&self, tile: usize) -> Result<&T> {
        self.check_tile(tile)?;
        self.tile_defaults[tile]
            .as_ref()
            .or(self.default.as_ref())
            .ok_or(AnalysisError::MissingDefault(self.name))
    }

    /// Returns the effective value of a component-scoped parameter.
    pub fn resolve_component(&self, component: usize) -> Result<&T> {
        self.check_component(component)?;
        self.component_defaults[component]
            .as_ref()
            .or(self.default.as_ref())
            .ok_or(AnalysisError::MissingDefault(self.name))
    }

    /// Precedence level `resolve(tile, component)` would read from.
    pub fn kind(&self, tile: usize, component: usize) -> ValueKind {
        if self.tile_component.contains_key(&(tile, component)) {
            ValueKind::TileComponent
        } else if self.tile_defaults.get(tile).is_some_and(Option::is_some) {
            ValueKind::TileDefault
        } else if self.component_defaults.get(component).is_some_and(Option::is_some) {
            ValueKind::ComponentDefault
        } else {
            ValueKind::Default
        }
    }

    /// True if a tile default was set for `tile`.
    pub fn is_tile_specified(&self, tile: usize) -> bool {
        self.tile_defaults.get(tile).is_some_and(Option::is_some)
    }

    /// True if a component default was set for `component`.
    pub fn is_component_specified(&self, component: usize) -> bool {
        self.component_defaults.get(component).is_some_and(Option::is_some)
    }

    pub fn is_tile_component_specified(&self, tile: usize, component: usize) -> bool {
        self.tile_component.contains_key(&(tile, component))
    }

    /// Parses an option string and stores every value it names.
    ///
    /// `parse` converts one value token. A selector that is not followed by a
    /// value is an error.
    pub fn parse_option<F>(&mut self, text: &str, mut parse: F) -> Result<()>
    where
        T: Clone,
        F: FnMut(&str) -> Result<T>,
    {
        let mut tiles: Option<Vec<usize>> = None;
        let mut components: Option<Vec<usize>> = None;

        for word in text.split_whitespace() {
            if let Some(list) = selector(word, 't') {
                tiles = Some(parse_index_set(list, self.num_tiles)?);
                continue;
            }
            if let Some(list) = selector(word, 'c') {
                components = Some(parse_index_set(list, self.num_components)?);
                continue;
            }

            let value = parse(word)?;
            match (tiles.take(), components.take()) {
                (None, None) => self.set_default(value),
                (Some(ts), None) => {
                    for t in ts {
                        self.set_tile_default(t, value.clone())?;
                    }
                }
                (None, Some(cs)) => {
                    for c in cs {
                        self.set_component_default(c, value.clone())?;
                    }
                }
                (Some(ts), Some(cs)) => {
                    for &t in &ts {
                        for &c in &cs {
                            self.set_tile_component(t, c, value.clone())?;
                        }
                    }
                }
            }
        }

        if tiles.is_some() || components.is_some() {
            return Err(AnalysisError::InvalidValue {
                parameter: self.name,
                value: text.to_string(),
            });
        }
        Ok(())
    }

    fn check_tile(&self, tile: usize) -> Result<()> {
        if tile >= self.num_tiles {
            return Err(AnalysisError::TileOutOfRange(tile, self.num_tiles));
        }
        Ok(())
    }

    fn check_component(&self, component: usize) -> Result<()> {
        if component >= self.num_components {
            return Err(AnalysisError::ComponentOutOfRange(component, self.num_components));
        }
        Ok(())
    }

    fn scope_error(&self, scope: &'static str) -> AnalysisError {
        AnalysisError::InvalidScope {
            parameter: self.name,
            scope,
        }
    }
}

/// Returns the index list of a `t...`/`c...` selector word.
fn selector(word: &str, prefix: char) -> Option<&str> {
    let rest = word.strip_prefix(prefix)?;
    rest.starts_with(|ch: char| ch.is_ascii_digit()).then_some(rest)
}

/// Parses an index list such as `0,2-4` into sorted, distinct indices below `limit`.
pub fn parse_index_set(list: &str, limit: usize) -> Result<Vec<usize>> {
    let bad = || AnalysisError::InvalidIndexSet(list.to_string());
    let mut selected = vec![false; limit];

    for part in list.split(',') {
        let (first, last) = match part.split_once('-') {
            Some((a, b)) => (
                a.parse::<usize>().map_err(|_| bad())?,
                b.parse::<usize>().map_err(|_| bad())?,
            ),
            None => {
                let i = part.parse::<usize>().map_err(|_| bad())?;
                (i, i)
            }
        };
        if first > last || last >= limit {
            return Err(bad());
        }
        selected[first..=last].iter_mut().for_each(|s| *s = true);
    }

    Ok(selected
        .iter()
        .enumerate()
        .filter_map(|(i, &s)| s.then_some(i))
        .collect())
}
