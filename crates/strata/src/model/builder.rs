//! Raw entries to the entity model.
//!
//! The builder runs in four steps:
//!
//! 1. validate every entry (unique ids, `end >= start`, colours);
//! 2. collapse `become` chains into single entities;
//! 3. resolve `merge`/`split`/`fork`/`links` names to entity indices,
//!    re-pointing names of collapsed entries to their chain's entity;
//! 4. compute cluster membership.
//!
//! Problems that make the time axis meaningless are fatal
//! ([`InputError`]); dangling references are [`Warning`]s.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, info, trace};

use strata_core::{color::Color, identifier::Id};

use super::{Entity, RelationKind, Segment, Span, Timeline, Warning, YEAR_LIMIT, record_warning};
use crate::{error::InputError, input::RawEntry};

/// Builds a [`Timeline`] from raw entries.
///
/// # Errors
///
/// - [`InputError::DuplicateId`] when two entries share an id.
/// - [`InputError::InvalidSpan`] when an entry, or a collapsed chain, ends
///   before it starts.
/// - [`InputError::YearOutOfRange`] for a year beyond [`YEAR_LIMIT`].
/// - [`InputError::InvalidColor`] for an unparsable colour.
/// - [`InputError::ContinuationCycle`] when `become` chains loop.
/// - [`InputError::SplitCycle`] when `split` parents loop.
///
/// # Examples
///
/// ```
/// # use strata::{input::RawEntry, model};
/// let timeline = model::build(vec![
///     RawEntry::new("a", 1900, 1950).with_become("b"),
///     RawEntry::new("b", 1950, 1990),
///     RawEntry::new("c", 1960, 2000).with_split("b"),
/// ])
/// .unwrap();
///
/// assert_eq!(timeline.entities().len(), 2);
/// assert_eq!(timeline.get("c").unwrap().split(), timeline.index_of("b"));
/// ```
pub fn build(entries: Vec<RawEntry>) -> Result<Timeline, InputError> {
    info!(entries = entries.len(); "Building timeline entities");

    let ids = validate(&entries)?;
    let mut warnings = Vec::new();

    let successors = resolve_continuations(&entries, &ids, &mut warnings)?;
    let chains = collect_chains(&entries, &successors)?;
    debug!(entities = chains.len(); "Continuation chains collapsed");

    // Raw entry index -> entity index
    let mut alias = vec![0; entries.len()];
    for (entity_idx, chain) in chains.iter().enumerate() {
        for &raw in chain {
            alias[raw] = entity_idx;
        }
    }

    let mut entities = Vec::with_capacity(chains.len());
    for (entity_idx, chain) in chains.iter().enumerate() {
        let mut entity = collapse_chain(&entries, chain)?;
        let resolver = Resolver {
            entries: &entries,
            ids: &ids,
            alias: &alias,
            owner: entity_idx,
            entity: entity.id,
        };
        resolver.resolve_relations(&mut entity, chain, &mut warnings);
        entities.push(entity);
    }

    check_split_cycles(&entities, &entries, &chains)?;
    annotate_clusters(&mut entities);

    let mut index = IndexMap::with_capacity(entries.len());
    for (raw, entry) in entries.iter().enumerate() {
        index.insert(Id::new(&entry.id), alias[raw]);
    }

    info!(
        entities = entities.len(),
        warnings = warnings.len();
        "Timeline built"
    );

    Ok(Timeline::new(entities, index, warnings))
}

/// Checks entries individually and maps id names to raw indices.
fn validate(entries: &[RawEntry]) -> Result<HashMap<&str, usize>, InputError> {
    let mut ids = HashMap::with_capacity(entries.len());

    for (idx, entry) in entries.iter().enumerate() {
        if ids.insert(entry.id.as_str(), idx).is_some() {
            return Err(InputError::DuplicateId {
                id: entry.id.clone(),
                span: entry.source_span.clone(),
            });
        }

        if entry.end < entry.start {
            return Err(InputError::InvalidSpan {
                id: entry.id.clone(),
                start: entry.start,
                end: entry.end,
                span: entry.source_span.clone(),
            });
        }

        if let Some(year) = [entry.start, entry.end]
            .into_iter()
            .find(|year| !(-YEAR_LIMIT..=YEAR_LIMIT).contains(year))
        {
            return Err(InputError::YearOutOfRange {
                id: entry.id.clone(),
                year,
                span: entry.source_span.clone(),
            });
        }

        if let Some(color) = &entry.color {
            Color::new(color).map_err(|message| InputError::InvalidColor {
                id: entry.id.clone(),
                message,
                span: entry.source_span.clone(),
            })?;
        }
    }

    Ok(ids)
}

/// Resolves each entry's `become` target, dropping unresolved or conflicting
/// claims. An entry that becomes itself is a one-entry cycle.
///
/// Returns the successor raw index per raw entry.
fn resolve_continuations(
    entries: &[RawEntry],
    ids: &HashMap<&str, usize>,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<Option<usize>>, InputError> {
    let mut successors = vec![None; entries.len()];
    let mut claimed_by: Vec<Option<usize>> = vec![None; entries.len()];

    for (idx, entry) in entries.iter().enumerate() {
        let Some(target_name) = &entry.continues_as else {
            continue;
        };
        let entry_id = Id::new(&entry.id);

        let Some(&target) = ids.get(target_name.as_str()) else {
            record_warning(
                warnings,
                Warning::UnresolvedReference {
                    entry: entry_id,
                    relation: RelationKind::Become,
                    target: target_name.clone(),
                },
            );
            continue;
        };

        if target == idx {
            return Err(InputError::ContinuationCycle {
                id: entry.id.clone(),
                span: entry.source_span.clone(),
            });
        }

        if let Some(kept) = claimed_by[target] {
            record_warning(
                warnings,
                Warning::ContinuationConflict {
                    target: Id::new(&entries[target].id),
                    kept: Id::new(&entries[kept].id),
                    dropped: entry_id,
                },
            );
            continue;
        }

        claimed_by[target] = Some(idx);
        successors[idx] = Some(target);
    }

    Ok(successors)
}

/// Groups raw entries into chains, one per head, in head input order.
///
/// Every entry has at most one predecessor, so a chain walked from a head can
/// never revisit an entry. Entries no head reaches sit on a cycle.
fn collect_chains(
    entries: &[RawEntry],
    successors: &[Option<usize>],
) -> Result<Vec<Vec<usize>>, InputError> {
    let mut has_predecessor = vec![false; entries.len()];
    for &successor in successors.iter().flatten() {
        has_predecessor[successor] = true;
    }

    let mut visited = vec![false; entries.len()];
    let mut chains = Vec::new();

    for head in (0..entries.len()).filter(|&idx| !has_predecessor[idx]) {
        let mut chain = Vec::new();
        let mut current = Some(head);
        while let Some(idx) = current {
            visited[idx] = true;
            chain.push(idx);
            current = successors[idx];
        }
        chains.push(chain);
    }

    if let Some(idx) = visited.iter().position(|seen| !seen) {
        return Err(InputError::ContinuationCycle {
            id: entries[idx].id.clone(),
            span: entries[idx].source_span.clone(),
        });
    }

    Ok(chains)
}

/// Creates one entity spanning a whole chain.
///
/// Identity, label, colour, `split` and manual row come from the head.
fn collapse_chain(entries: &[RawEntry], chain: &[usize]) -> Result<Entity, InputError> {
    let head = &entries[chain[0]];
    let terminal = &entries[chain[chain.len() - 1]];

    if terminal.end < head.start {
        return Err(InputError::InvalidSpan {
            id: head.id.clone(),
            start: head.start,
            end: terminal.end,
            span: head.source_span.clone(),
        });
    }

    let id = Id::new(&head.id);
    let name = head.name.clone().unwrap_or_else(|| head.id.clone());
    let mut entity = Entity::new(id, name, Span::new(head.start, terminal.end));

    entity.segments = chain
        .iter()
        .map(|&raw| {
            let entry = &entries[raw];
            Segment::new(Id::new(&entry.id), Span::new(entry.start, entry.end))
        })
        .collect();
    // Colours were validated up front
    entity.color = chain
        .iter()
        .find_map(|&raw| entries[raw].color.as_deref())
        .and_then(|color| Color::new(color).ok());
    entity.manual_row = head.row;
    entity.row = head.row;

    if chain.len() > 1 {
        trace!(entity:% = id, segments = chain.len(); "Collapsed continuation chain");
    }

    Ok(entity)
}

/// Name-to-index resolution for the relations of one entity.
struct Resolver<'a> {
    entries: &'a [RawEntry],
    ids: &'a HashMap<&'a str, usize>,
    alias: &'a [usize],
    /// Entity being resolved.
    owner: usize,
    entity: Id,
}

impl Resolver<'_> {
    fn resolve_relations(&self, entity: &mut Entity, chain: &[usize], warnings: &mut Vec<Warning>) {
        let head = &self.entries[chain[0]];
        let terminal = &self.entries[chain[chain.len() - 1]];

        entity.split = head
            .split
            .as_deref()
            .and_then(|name| self.resolve(name, RelationKind::Split, warnings));
        entity.merge = terminal
            .merge
            .as_deref()
            .and_then(|name| self.resolve(name, RelationKind::Merge, warnings));
        entity.fork = terminal
            .fork
            .iter()
            .filter_map(|name| self.resolve(name, RelationKind::Fork, warnings))
            .collect();

        let mut seen = HashSet::new();
        entity.links = chain
            .iter()
            .flat_map(|&raw| self.entries[raw].links.iter())
            .filter_map(|name| self.resolve(name, RelationKind::Link, warnings))
            .filter(|&target| seen.insert(target))
            .collect();
    }

    fn resolve(&self, name: &str, relation: RelationKind, warnings: &mut Vec<Warning>) -> Option<usize> {
        let Some(&raw) = self.ids.get(name) else {
            record_warning(
                warnings,
                Warning::UnresolvedReference {
                    entry: self.entity,
                    relation,
                    target: name.to_string(),
                },
            );
            return None;
        };

        let target = self.alias[raw];
        if target == self.owner {
            record_warning(
                warnings,
                Warning::SelfReference {
                    entry: self.entity,
                    relation,
                },
            );
            return None;
        }

        Some(target)
    }
}

/// Rejects entities that are, through `split`, their own ancestor.
fn check_split_cycles(
    entities: &[Entity],
    entries: &[RawEntry],
    chains: &[Vec<usize>],
) -> Result<(), InputError> {
    // 0 = unvisited, 1 = on the current walk, 2 = known acyclic
    let mut state = vec![0u8; entities.len()];

    for start in 0..entities.len() {
        let mut walk = Vec::new();
        let mut current = Some(start);

        while let Some(idx) = current {
            match state[idx] {
                2 => break,
                1 => {
                    let head = &entries[chains[idx][0]];
                    return Err(InputError::SplitCycle {
                        id: head.id.clone(),
                        span: head.source_span.clone(),
                    });
                }
                _ => {
                    state[idx] = 1;
                    walk.push(idx);
                    current = entities[idx].split;
                }
            }
        }

        for idx in walk {
            state[idx] = 2;
        }
    }

    Ok(())
}

/// Annotates every entity whose cluster has more than one member.
///
/// The cluster of `e` is `e` itself plus:
/// - entities that split from `e`;
/// - entities that merge into `e`, unless `e` split from them or the merge
///   lands exactly where `e` starts (that is sequencing, not clustering);
/// - the entity `e` merges into, when it starts exactly where `e` ends.
fn annotate_clusters(entities: &mut [Entity]) {
    let mut clusters = Vec::with_capacity(entities.len());

    for (idx, entity) in entities.iter().enumerate() {
        let mut members = vec![idx];

        for (other_idx, other) in entities.iter().enumerate() {
            if other_idx == idx {
                continue;
            }
            let splits_from = other.split == Some(idx);
            let merges_into = other.merge == Some(idx)
                && entity.split != Some(other_idx)
                && other.span.end() != entity.span.start();
            if splits_from || merges_into {
                members.push(other_idx);
            }
        }

        if let Some(target) = entity.merge {
            if entities[target].span.start() == entity.span.end() && !members.contains(&target) {
                members.push(target);
            }
        }

        clusters.push(members);
    }

    for (entity, members) in entities.iter_mut().zip(clusters) {
        if members.len() > 1 {
            trace!(entity:% = entity.id, members = members.len(); "Cluster annotated");
            entity.cluster = Some(members);
        }
    }
}
