use std::net::IpAddr;

use chrono::Utc;
use rusqlite::params;
use serde::Serialize;

use crate::errors::VulnscanError;
use super::Database;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupSummary {
    pub id: i64,
    pub name: String,
    pub target_count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LocalTarget {
    pub id: i64,
    pub name: String,
    pub ip_address: String,
    pub group_id: Option<i64>,
}

fn group_exists(conn: &rusqlite::Connection, id: i64) -> Result<bool, VulnscanError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM groups WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )
    .map_err(|e| VulnscanError::Database(format!("Query error: {}", e)))
}

fn name_taken(conn: &rusqlite::Connection, name: &str, exclude: i64) -> Result<bool, VulnscanError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM groups WHERE name = ?1 AND id != ?2)",
        params![name, exclude],
        |row| row.get(0),
    )
    .map_err(|e| VulnscanError::Database(format!("Query error: {}", e)))
}

impl Database {
    pub fn create_group(&self, name: &str) -> Result<i64, VulnscanError> {
        let conn = self.lock()?;
        if name_taken(&conn, name, -1)? {
            return Err(VulnscanError::Conflict("Group already exists".into()));
        }
        conn.execute(
            "INSERT INTO groups (name, created_at) VALUES (?1, ?2)",
            params![name, Utc::now().to_rfc3339()],
        ).map_err(|e| VulnscanError::Database(format!("Failed to create group: {}", e)))?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_groups(&self) -> Result<Vec<GroupSummary>, VulnscanError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT g.id, g.name, COUNT(t.id) FROM groups g LEFT JOIN targets t ON t.group_id = g.id GROUP BY g.id, g.name ORDER BY g.id"
        ).map_err(|e| VulnscanError::Database(format!("Query failed: {}", e)))?;

        let rows = stmt.query_map([], |row| {
            Ok(GroupSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                target_count: row.get(2)?,
            })
        }).map_err(|e| VulnscanError::Database(format!("Query error: {}", e)))?;

        let mut groups = Vec::new();
        for row in rows {
            groups.push(row.map_err(|e| VulnscanError::Database(format!("Row error: {}", e)))?);
        }
        Ok(groups)
    }

    pub fn rename_group(&self, id: i64, name: &str) -> Result<(), VulnscanError> {
        let conn = self.lock()?;
        if !group_exists(&conn, id)? {
            return Err(VulnscanError::NotFound("Group not found".into()));
        }
        if name_taken(&conn, name, id)? {
            return Err(VulnscanError::Conflict("Group already exists".into()));
        }
        conn.execute("UPDATE groups SET name = ?2 WHERE id = ?1", params![id, name])
            .map_err(|e| VulnscanError::Database(format!("Update failed: {}", e)))?;
        Ok(())
    }

    /// Deletes the group; its targets stay behind with no group.
    pub fn delete_group(&self, id: i64) -> Result<(), VulnscanError> {
        let conn = self.lock()?;
        let affected = conn
            .execute("DELETE FROM groups WHERE id = ?1", params![id])
            .map_err(|e| VulnscanError::Database(format!("Delete failed: {}", e)))?;
        if affected == 0 {
            return Err(VulnscanError::NotFound("Group not found".into()));
        }
        Ok(())
    }

    pub fn add_target(&self, name: &str, ip_address: &str, group_id: i64) -> Result<i64, VulnscanError> {
        let ip: IpAddr = ip_address
            .trim()
            .parse()
            .map_err(|_| VulnscanError::Validation("Invalid IP address".into()))?;

        let conn = self.lock()?;
        if !group_exists(&conn, group_id)? {
            return Err(VulnscanError::NotFound("Group not found".into()));
        }
        conn.execute(
            "INSERT INTO targets (name, ip_address, group_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![name, ip.to_string(), group_id, Utc::now().to_rfc3339()],
        ).map_err(|e| VulnscanError::Database(format!("Failed to add target: {}", e)))?;
        Ok(conn.last_insert_rowid())
    }

    pub fn remove_from_group(&self, target_id: i64, group_id: i64) -> Result<(), VulnscanError> {
        let conn = self.lock()?;
        let affected = conn
            .execute(
                "UPDATE targets SET group_id = NULL WHERE id = ?1 AND group_id = ?2",
                params![target_id, group_id],
            )
            .map_err(|e| VulnscanError::Database(format!("Update failed: {}", e)))?;
        if affected == 0 {
            return Err(VulnscanError::NotFound("Target not found in group".into()));
        }
        Ok(())
    }

    pub fn get_group_targets(&self, group_id: i64) -> Result<Vec<LocalTarget>, VulnscanError> {
        let conn = self.lock()?;
        if !group_exists(&conn, group_id)? {
            return Err(VulnscanError::NotFound("Group not found".into()));
        }
        let mut stmt = conn.prepare(
            "SELECT id, name, ip_address, group_id FROM targets WHERE group_id = ?1 ORDER BY id"
        ).map_err(|e| VulnscanError::Database(format!("Query failed: {}", e)))?;

        let rows = stmt.query_map(params![group_id], |row| {
            Ok(LocalTarget {
                id: row.get(0)?,
                name: row.get(1)?,
                ip_address: row.get(2)?,
                group_id: row.get(3)?,
            })
        }).map_err(|e| VulnscanError::Database(format!("Query error: {}", e)))?;

        let mut targets = Vec::new();
        for row in rows {
            targets.push(row.map_err(|e| VulnscanError::Database(format!("Row error: {}", e)))?);
        }
        Ok(targets)
    }

    pub fn get_target(&self, id: i64) -> Result<Option<LocalTarget>, VulnscanError> {
        use rusqlite::OptionalExtension;
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name, ip_address, group_id FROM targets WHERE id = ?1",
            params![id],
            |row| {
                Ok(LocalTarget {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    ip_address: row.get(2)?,
                    group_id: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(|e| VulnscanError::Database(format!("Query error: {}", e)))
    }

    pub fn delete_target(&self, id: i64) -> Result<(), VulnscanError> {
        let conn = self.lock()?;
        let affected = conn
            .execute("DELETE FROM targets WHERE id = ?1", params![id])
            .map_err(|e| VulnscanError::Database(format!("Delete failed: {}", e)))?;
        if affected == 0 {
            return Err(VulnscanError::NotFound("Target not found".into()));
        }
        Ok(())
    }
}
