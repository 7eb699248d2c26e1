//! AttachmentRepository - attachments table
//!
//! Attachments are written together with their bill (see `BillRepository::create`)
//! and removed by cascade, so only reads live here.

use crate::entities::Attachment;
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};

pub struct AttachmentRepository {
    connection_pool: SqlitePool,
}

impl AttachmentRepository {
    pub fn new(connection_pool: SqlitePool) -> AttachmentRepository {
        Self { connection_pool }
    }

    pub async fn find_by_bills(&self, bill_ids: &[i64]) -> Result<Vec<Attachment>, Error> {
        if bill_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT attachment_id, bill_id, file_name, url, size_bytes, mime_type, uploaded_by_id, created_at
             FROM attachments WHERE bill_id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in bill_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY attachment_id");

        let attachments = builder
            .build_query_as::<Attachment>()
            .fetch_all(&self.connection_pool)
            .await?;

        Ok(attachments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "windows", "events", "bills")))]
    async fn test_find_by_bills(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = AttachmentRepository::new(pool);
        let attachments = repo.find_by_bills(&[1, 2]).await?;
        let names: Vec<&str> = attachments.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(names, vec!["receipt.jpg", "parking.pdf"]);
        assert!(repo.find_by_bills(&[]).await?.is_empty());
        Ok(())
    }
}
