use super::*;
use crate::geom::Size;
use crate::tile::{DisplayPolicy, SourceId};

fn make_collection(n: usize) -> TileCollection {
    let mut c = TileCollection::new();
    for _ in 0..n {
        c.insert_blank();
    }
    c
}

fn ids(c: &TileCollection) -> Vec<TileId> {
    c.iter().map(|t| t.id).collect()
}

fn image_tile(name: &str) -> Tile {
    Tile::with_image(SourceId(name.into()), Size::new(100.0, 50.0), DisplayPolicy::AspectFit)
}

// =============================================================
// insert_blank
// =============================================================

#[test]
fn new_collection_is_empty() {
    let c = TileCollection::new();
    assert!(c.is_empty());
    assert_eq!(c.len(), 0);
}

#[test]
fn insert_blank_appends() {
    let mut c = make_collection(2);
    let id = c.insert_blank();
    assert_eq!(c.len(), 3);
    assert_eq!(c.get(2).map(|t| t.id), id);
    assert!(c.get(2).is_some_and(Tile::is_blank));
}

#[test]
fn insert_blank_allows_duplicates_by_default() {
    let mut c = make_collection(1);
    assert!(c.insert_blank().is_some());
    assert_eq!(c.len(), 2);
}

#[test]
fn insert_blank_blocked_while_blank_exists() {
    let mut c = make_collection(1);
    c.set_block_duplicate_blanks(true);
    let before = c.revision();
    assert!(c.insert_blank().is_none());
    assert_eq!(c.len(), 1);
    assert_eq!(c.revision(), before);
}

#[test]
fn insert_blank_blocked_policy_allows_when_no_blank() {
    let mut c = TileCollection::from_tiles(vec![image_tile("a")]);
    c.set_block_duplicate_blanks(true);
    assert!(c.insert_blank().is_some());
    assert!(c.insert_blank().is_none());
}

// =============================================================
// remove_at
// =============================================================

#[test]
fn remove_at_shifts_later_tiles() {
    let mut c = make_collection(3);
    let before = ids(&c);
    let removed = c.remove_at(1).map(|t| t.id);
    assert_eq!(removed, Some(before[1]));
    assert_eq!(ids(&c), vec![before[0], before[2]]);
}

#[test]
fn remove_at_out_of_range_is_noop() {
    let mut c = make_collection(2);
    let rev = c.revision();
    assert!(c.remove_at(5).is_none());
    assert_eq!(c.len(), 2);
    assert_eq!(c.revision(), rev);
}

#[test]
fn remove_last_tile_empties() {
    let mut c = make_collection(1);
    c.remove_at(0);
    assert!(c.is_empty());
}

// =============================================================
// move_to
// =============================================================

#[test]
fn move_to_forward_preserves_relative_order() {
    let mut c = make_collection(4);
    let b = ids(&c);
    assert!(c.move_to(0, 2));
    assert_eq!(ids(&c), vec![b[1], b[2], b[0], b[3]]);
}

#[test]
fn move_to_backward_preserves_relative_order() {
    let mut c = make_collection(4);
    let b = ids(&c);
    assert!(c.move_to(3, 0));
    assert_eq!(ids(&c), vec![b[3], b[0], b[1], b[2]]);
}

#[test]
fn move_to_clamps_destination() {
    let mut c = make_collection(3);
    let b = ids(&c);
    assert!(c.move_to(0, 99));
    assert_eq!(ids(&c), vec![b[1], b[2], b[0]]);
}

#[test]
fn move_to_invalid_source_is_noop() {
    let mut c = make_collection(2);
    let b = ids(&c);
    assert!(!c.move_to(7, 0));
    assert_eq!(ids(&c), b);
}

// =============================================================
// replace_at / replace_all
// =============================================================

#[test]
fn replace_at_overwrites_without_structural_change() {
    let mut c = make_collection(2);
    let rev = c.revision();
    let tile = image_tile("a");
    let id = tile.id;
    assert!(c.replace_at(1, tile));
    assert_eq!(c.get(1).map(|t| t.id), Some(id));
    assert_eq!(c.revision(), rev);
}

#[test]
fn replace_at_out_of_range_fails() {
    let mut c = make_collection(1);
    assert!(!c.replace_at(3, image_tile("a")));
}

#[test]
fn replace_all_is_structural() {
    let mut c = make_collection(2);
    let rev = c.revision();
    c.replace_all(vec![image_tile("a")]);
    assert_eq!(c.len(), 1);
    assert!(c.revision() > rev);
}

// =============================================================
// Queries
// =============================================================

#[test]
fn position_tracks_tile_after_reorder() {
    let mut c = make_collection(3);
    let id = ids(&c)[0];
    c.move_to(0, 2);
    assert_eq!(c.position(id), Some(2));
}

#[test]
fn has_blank_reflects_content() {
    let mut c = TileCollection::from_tiles(vec![image_tile("a")]);
    assert!(!c.has_blank());
    c.insert_blank();
    assert!(c.has_blank());
}

#[test]
fn structural_ops_bump_revision() {
    let mut c = TileCollection::new();
    let r0 = c.revision();
    c.insert_blank();
    let r1 = c.revision();
    c.insert_blank();
    c.move_to(0, 1);
    let r2 = c.revision();
    c.remove_at(0);
    let r3 = c.revision();
    assert!(r0 < r1 && r1 < r2 && r2 < r3);
}

#[test]
fn equality_ignores_revision() {
    let c = make_collection(2);
    let mut other = TileCollection::from_tiles(c.as_slice().to_vec());
    other.set_block_duplicate_blanks(true);
    assert_eq!(c, other);
}

#[test]
fn clone_is_independent() {
    let c = make_collection(1);
    let mut copy = c.clone();
    if let Some(t) = copy.get_mut(0) {
        t.set_image(SourceId("a".into()), Size::new(1.0, 1.0), DisplayPolicy::AspectFit);
    }
    assert!(c.get(0).is_some_and(Tile::is_blank));
    assert!(copy.get(0).is_some_and(|t| !t.is_blank()));
}
