//! Batched eager loading of related records.
//!
//! A [`RelationEdge`] says how to read the join key from a parent and how
//! to attach a child to it. A [`RelationSource`] returns the children for
//! a set of keys, each tagged with the key it was selected for. Loading a
//! relation for any number of parents costs one source call, and no call
//! at all when there are no keys.
//!
//! Deeper relations are loaded hop by hop: after `classrooms -> subjects`
//! has been stitched, `subjects -> lessons` runs against the subjects held
//! by all classrooms at once.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use async_trait::async_trait;
use tracing::{debug, trace};

use schoolhub_core::result::AppResult;

use crate::connection::{Gateway, Operation};
use crate::filter::Clause;
use crate::record::{ParentKey, Record, RecordMarker, scan_all};
use crate::template::QueryTemplate;

/// How a fetched child is attached to its parent.
pub enum Stitch<P, C> {
    /// Overwrite a singular relation field.
    One(fn(&mut P, C)),
    /// Append to a collection field.
    Many(fn(&mut P) -> &mut Vec<C>),
}

/// Association from parents of type `P` to children of type `C`.
pub struct RelationEdge<P, C, K = String> {
    name: &'static str,
    parent_key: fn(&P) -> Option<K>,
    stitch: Stitch<P, C>,
}

impl<P, C, K> RelationEdge<P, C, K>
where
    C: Clone,
    K: Eq + Hash + Clone,
{
    /// A to-one relation; the last matching child wins.
    pub fn one(name: &'static str, parent_key: fn(&P) -> Option<K>, set: fn(&mut P, C)) -> Self {
        Self {
            name,
            parent_key,
            stitch: Stitch::One(set),
        }
    }

    /// A to-many relation; children are appended in fetch order.
    pub fn many(
        name: &'static str,
        parent_key: fn(&P) -> Option<K>,
        children: fn(&mut P) -> &mut Vec<C>,
    ) -> Self {
        Self {
            name,
            parent_key,
            stitch: Stitch::Many(children),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Distinct keys of `parents`, in first-seen order.
    pub fn keys<'a, I>(&self, parents: I) -> Vec<K>
    where
        I: IntoIterator<Item = &'a P>,
        P: 'a,
    {
        let mut seen = HashSet::new();
        parents
            .into_iter()
            .filter_map(|p| (self.parent_key)(p))
            .filter(|k| seen.insert(k.clone()))
            .collect()
    }

    /// Attach every child to each parent whose key matches.
    ///
    /// Children whose key matches no parent are dropped.
    pub fn stitch<'a, I>(&self, parents: I, rows: Vec<(C, K)>)
    where
        I: IntoIterator<Item = &'a mut P>,
        P: 'a,
    {
        let mut parents: Vec<&mut P> = parents.into_iter().collect();
        let mut index: HashMap<K, Vec<usize>> = HashMap::new();
        for (pos, parent) in parents.iter().enumerate() {
            if let Some(key) = (self.parent_key)(parent) {
                index.entry(key).or_default().push(pos);
            }
        }

        for (child, key) in rows {
            let Some(positions) = index.get(&key) else {
                continue;
            };
            let Some((last, rest)) = positions.split_last() else {
                continue;
            };
            for &pos in rest {
                self.attach(&mut *parents[pos], child.clone());
            }
            self.attach(&mut *parents[*last], child);
        }
    }

    fn attach(&self, parent: &mut P, child: C) {
        match self.stitch {
            Stitch::One(set) => set(parent, child),
            Stitch::Many(children) => children(parent).push(child),
        }
    }
}

/// Fetches the children for a set of parent keys.
#[async_trait]
pub trait RelationSource<C, K>: Send + Sync {
    /// Return `(child, parent_key)` pairs for `keys` in one round trip.
    async fn fetch(&self, keys: &[K]) -> AppResult<Vec<(C, K)>>;
}

/// Relation source backed by one `key = ANY($1)` select.
#[derive(Debug, Clone)]
pub struct PgRelation<C> {
    gateway: Gateway,
    template: QueryTemplate,
    key_expr: &'static str,
    _record: RecordMarker<C>,
}

impl<C: Record> PgRelation<C> {
    /// Select children of type `C` whose `key_expr` matches the parent keys.
    pub fn new(gateway: Gateway, template: QueryTemplate, key_expr: &'static str) -> Self {
        Self {
            gateway,
            template,
            key_expr,
            _record: Default::default(),
        }
    }
}

#[async_trait]
impl<C: Record> RelationSource<C, String> for PgRelation<C> {
    async fn fetch(&self, keys: &[String]) -> AppResult<Vec<(C, String)>> {
        let op = Operation::read(C::ENTITY, "load_related");
        let mut clause = Clause::new();
        clause.any(self.key_expr, keys.to_vec(), "text")?;
        let (sql, args) = self.template.select_related(clause, self.key_expr)?;
        let rows = self.gateway.fetch_all(op, &sql, args).await?;
        let scanned = scan_all::<C, ParentKey<String>>(op, &rows)?;
        Ok(scanned
            .into_iter()
            .map(|s| (s.record, s.aux.0))
            .collect())
    }
}

/// Fetch the children for `parents` without attaching them.
///
/// Lets independent relations of the same parents be fetched concurrently
/// and stitched afterwards.
pub async fn prefetch<'a, P, C, K, S, I>(
    edge: &RelationEdge<P, C, K>,
    source: &S,
    parents: I,
) -> AppResult<Vec<(C, K)>>
where
    P: 'a,
    C: Clone,
    K: Eq + Hash + Clone + Send + Sync,
    S: RelationSource<C, K> + ?Sized,
    I: IntoIterator<Item = &'a P>,
{
    let keys = edge.keys(parents);
    if keys.is_empty() {
        trace!(relation = edge.name, "No parent keys, skipping relation");
        return Ok(Vec::new());
    }
    let rows = source
        .fetch(&keys)
        .await
        .map_err(|e| e.context(format!("loading relation {}", edge.name)))?;
    debug!(
        relation = edge.name,
        keys = keys.len(),
        rows = rows.len(),
        "Loaded relation"
    );
    Ok(rows)
}

/// Fetch and attach one relation for all `parents`.
pub async fn load<'a, P, C, K, S, I>(
    edge: &RelationEdge<P, C, K>,
    source: &S,
    parents: I,
) -> AppResult<()>
where
    P: 'a + Send,
    C: Clone,
    K: Eq + Hash + Clone + Send + Sync,
    S: RelationSource<C, K> + ?Sized,
    I: IntoIterator<Item = &'a mut P>,
{
    let parents: Vec<&'a mut P> = parents.into_iter().collect();
    let rows = prefetch(edge, source, parents.iter().map(|p| &**p)).await?;
    edge.stitch(parents, rows);
    Ok(())
}
