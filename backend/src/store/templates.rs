use crate::error::{StoreError, StoreResult};
use crate::store::Store;
use common::model::template::Template;
use rusqlite::{params, OptionalExtension, Row};

const COLUMNS: &str = "id, name, subject, from_name, reply_to, cc, bcc, to_email, content";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Template> {
    Ok(Template {
        id: row.get(0)?,
        name: row.get(1)?,
        subject: row.get(2)?,
        from_name: row.get(3)?,
        reply_to: row.get(4)?,
        cc: row.get(5)?,
        bcc: row.get(6)?,
        to_email: row.get(7)?,
        content: row.get(8)?,
    })
}

fn not_found(id: &str) -> StoreError {
    StoreError::NotFound {
        kind: "Template",
        id: id.to_string(),
    }
}

impl Store {
    /// Inserts the template or replaces the stored one with the same id.
    pub fn save_template(&self, template: &Template) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            &format!("INSERT OR REPLACE INTO templates ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                template.id,
                template.name,
                template.subject,
                template.from_name,
                template.reply_to,
                template.cc,
                template.bcc,
                template.to_email,
                template.content,
            ],
        )?;
        Ok(())
    }

    pub fn get_template(&self, id: &str) -> StoreResult<Template> {
        let conn = self.connect()?;
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM templates WHERE id = ?1"),
            params![id],
            from_row,
        )
        .optional()?
        .ok_or_else(|| not_found(id))
    }

    pub fn list_templates(&self) -> StoreResult<Vec<Template>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM templates ORDER BY name, id"))?;
        let templates = stmt
            .query_map([], from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(templates)
    }

    pub fn delete_template(&self, id: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        let deleted = conn.execute("DELETE FROM templates WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
