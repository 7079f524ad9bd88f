use rusqlite::Connection;
use serde_json::{Map, Value};

use plaza_types::Snapshot;

use crate::StoreError;
use crate::models::DocumentRow;

/// Split a store path into segments. Paths are `/`-separated, non-empty, and
/// have no empty segments.
pub fn segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let segs: Vec<&str> = path.split('/').collect();
    if path.is_empty() || segs.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(segs)
}

/// Whether a change at `a` is visible from a watch on `b` (or vice versa).
pub fn overlaps(a: &str, b: &str) -> bool {
    fn under(child: &str, parent: &str) -> bool {
        child.len() > parent.len()
            && child.starts_with(parent)
            && child.as_bytes()[parent.len()] == b'/'
    }
    a == b || under(a, b) || under(b, a)
}

// -- Reads --

/// Current value at `path`: a stored document, a field inside one, or a
/// collection assembled from every document below it.
pub fn read(conn: &Connection, path: &str) -> Result<Snapshot, StoreError> {
    let segs = segments(path)?;

    if let Some((depth, row)) = find_covering(conn, &segs)? {
        let body = row.parse()?;
        return Ok(Snapshot::from(navigate(&body, &segs[depth..])));
    }

    let rows = query_descendants(conn, path)?;
    if rows.is_empty() {
        return Ok(Snapshot::Absent);
    }

    let mut tree = Value::Object(Map::new());
    for row in &rows {
        set_in(&mut tree, &row.segments_below(path), row.parse()?);
    }
    Ok(Snapshot::from_value(tree))
}

// -- Writes --

/// Replace the subtree at `path` with `value`. `null` or an empty object
/// removes it. A path inside an existing document patches that document.
pub fn put(conn: &Connection, path: &str, value: Value) -> Result<(), StoreError> {
    let segs = segments(path)?;
    let removing = is_empty(&value);

    if let Some((depth, row)) = find_covering(conn, &segs[..segs.len() - 1])? {
        let mut body = row.parse()?;
        let rel = &segs[depth..];
        if removing {
            remove_in(&mut body, rel);
        } else {
            set_in(&mut body, rel, value);
        }

        if is_empty(&body) {
            conn.execute("DELETE FROM documents WHERE path = ?1", [&row.path])?;
        } else {
            conn.execute(
                "UPDATE documents SET body = ?2, updated_at = datetime('now') WHERE path = ?1",
                (&row.path, body.to_string()),
            )?;
        }
        return Ok(());
    }

    delete_subtree(conn, path)?;
    if !removing {
        conn.execute(
            "INSERT INTO documents (path, body) VALUES (?1, ?2)",
            (path, value.to_string()),
        )?;
    }
    Ok(())
}

/// Merge `fields` into the record at `path`, one field at a time.
pub fn update(conn: &Connection, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
    segments(path)?;
    for (field, value) in fields {
        if field.is_empty() || field.contains('/') {
            return Err(StoreError::InvalidPath(format!("{}/{}", path, field)));
        }
        put(conn, &format!("{}/{}", path, field), value)?;
    }
    Ok(())
}

/// Next generated key. Fixed-width hex of a store-wide counter, so keys sort
/// in the order they were handed out.
pub fn next_key(conn: &Connection) -> Result<String, StoreError> {
    let value: i64 = conn.query_row(
        "UPDATE key_sequence SET value = value + 1 WHERE id = 0 RETURNING value",
        [],
        |row| row.get(0),
    )?;
    Ok(format!("{:016x}", value))
}

fn delete_subtree(conn: &Connection, path: &str) -> Result<(), StoreError> {
    conn.execute("DELETE FROM documents WHERE path = ?1", [path])?;
    conn.execute(
        "DELETE FROM documents WHERE path > ?1 AND path < ?2",
        (format!("{}/", path), format!("{}0", path)),
    )?;
    Ok(())
}

// -- Row lookups --

/// The stored document at `segs` or at one of its ancestors, with the number
/// of segments its path spans.
fn find_covering(conn: &Connection, segs: &[&str]) -> Result<Option<(usize, DocumentRow)>, StoreError> {
    let mut stmt = conn.prepare_cached("SELECT path, body FROM documents WHERE path = ?1")?;
    for depth in 1..=segs.len() {
        let prefix = segs[..depth].join("/");
        let row = stmt
            .query_row([&prefix], |row| {
                Ok(DocumentRow {
                    path: row.get(0)?,
                    body: row.get(1)?,
                })
            })
            .optional()?;
        if let Some(row) = row {
            return Ok(Some((depth, row)));
        }
    }
    Ok(None)
}

fn query_descendants(conn: &Connection, path: &str) -> Result<Vec<DocumentRow>, StoreError> {
    // Every path starting with "{path}/" sorts between "{path}/" and "{path}0".
    let mut stmt = conn.prepare_cached(
        "SELECT path, body FROM documents WHERE path > ?1 AND path < ?2 ORDER BY path",
    )?;

    let rows = stmt
        .query_map((format!("{}/", path), format!("{}0", path)), |row| {
            Ok(DocumentRow {
                path: row.get(0)?,
                body: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

// -- JSON tree helpers --

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn navigate(value: &Value, segs: &[&str]) -> Option<Value> {
    let mut node = value;
    for seg in segs {
        node = node.as_object()?.get(*seg)?;
    }
    Some(node.clone())
}

fn set_in(node: &mut Value, segs: &[&str], value: Value) {
    let Some((first, rest)) = segs.split_first() else {
        *node = value;
        return;
    };

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(first.to_string()).or_insert(Value::Null);
        set_in(child, rest, value);
    }
}

/// Remove the value at `segs`, pruning objects left empty on the way back up.
fn remove_in(node: &mut Value, segs: &[&str]) {
    let Some((first, rest)) = segs.split_first() else {
        *node = Value::Null;
        return;
    };
    let Some(map) = node.as_object_mut() else {
        return;
    };

    if rest.is_empty() {
        map.remove(*first);
        return;
    }

    if let Some(child) = map.get_mut(*first) {
        remove_in(child, rest);
        if is_empty(child) {
            map.remove(*first);
        }
    }
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, StoreError>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, StoreError> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
