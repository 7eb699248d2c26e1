//! BillRepository - bills and bill_items tables

use super::{Create, Delete, Read};
use crate::dtos::CreateBillDTO;
use crate::entities::{Bill, BillItem};
use chrono::Utc;
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};

const BILL_COLUMNS: &str = "bill_id, event_id, payer_id, subtotal_cents, tax_cents, tip_cents, \
     total_cents, currency, notes, created_at";

pub struct BillRepository {
    connection_pool: SqlitePool,
}

impl BillRepository {
    pub fn new(connection_pool: SqlitePool) -> BillRepository {
        Self { connection_pool }
    }

    /// Bills of an event, newest first
    pub async fn find_by_event(&self, event_id: i64) -> Result<Vec<Bill>, Error> {
        let bills = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE event_id = ?
             ORDER BY created_at DESC, bill_id DESC"
        ))
        .bind(event_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(bills)
    }

    pub async fn count_by_event(&self, event_id: i64) -> Result<i64, Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bills WHERE event_id = ?")
            .bind(event_id)
            .fetch_one(&self.connection_pool)
            .await?;

        Ok(count)
    }

    /// Sum of the bill totals of an event, in cents
    pub async fn total_for_event(&self, event_id: i64) -> Result<i64, Error> {
        let (total,): (i64,) =
            sqlx::query_as("SELECT COALESCE(SUM(total_cents), 0) FROM bills WHERE event_id = ?")
                .bind(event_id)
                .fetch_one(&self.connection_pool)
                .await?;

        Ok(total)
    }

    /// Sum of the bills `user_id` paid in events where they confirmed attendance
    pub async fn total_paid_in_confirmed_events(&self, user_id: &str) -> Result<i64, Error> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(b.total_cents), 0)
             FROM bills b
             WHERE b.payer_id = ?
               AND EXISTS (SELECT 1 FROM attendances a
                            WHERE a.event_id = b.event_id
                              AND a.user_id = b.payer_id
                              AND a.status = 'CONFIRMED')",
        )
        .bind(user_id)
        .fetch_one(&self.connection_pool)
        .await?;

        Ok(total)
    }

    /// Line items of several bills in one query
    pub async fn items_for_bills(&self, bill_ids: &[i64]) -> Result<Vec<BillItem>, Error> {
        if bill_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT bill_item_id, bill_id, label, amount_cents, quantity FROM bill_items WHERE bill_id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in bill_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY bill_item_id");

        let items = builder
            .build_query_as::<BillItem>()
            .fetch_all(&self.connection_pool)
            .await?;

        Ok(items)
    }
}

impl Create<Bill, CreateBillDTO> for BillRepository {
    /// Writes the bill, its items and its attachments in one transaction
    async fn create(&self, data: &CreateBillDTO) -> Result<Bill, Error> {
        let now = Utc::now();
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO bills (event_id, payer_id, subtotal_cents, tax_cents, tip_cents, total_cents, currency, notes, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(data.event_id)
        .bind(&data.payer_id)
        .bind(data.subtotal_cents)
        .bind(data.tax_cents)
        .bind(data.tip_cents)
        .bind(data.total_cents)
        .bind(&data.currency)
        .bind(&data.notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let bill_id = result.last_insert_rowid();

        for item in &data.items {
            sqlx::query(
                "INSERT INTO bill_items (bill_id, label, amount_cents, quantity) VALUES (?, ?, ?, ?)",
            )
            .bind(bill_id)
            .bind(&item.label)
            .bind(item.amount_cents)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        for attachment in &data.attachments {
            sqlx::query(
                "INSERT INTO attachments (bill_id, file_name, url, size_bytes, mime_type, uploaded_by_id, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(bill_id)
            .bind(&attachment.file_name)
            .bind(&attachment.url)
            .bind(attachment.size_bytes)
            .bind(&attachment.mime_type)
            .bind(&data.payer_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Bill {
            bill_id,
            event_id: data.event_id,
            payer_id: data.payer_id.clone(),
            subtotal_cents: data.subtotal_cents,
            tax_cents: data.tax_cents,
            tip_cents: data.tip_cents,
            total_cents: data.total_cents,
            currency: data.currency.clone(),
            notes: data.notes.clone(),
            created_at: now,
        })
    }
}

impl Read<Bill, i64> for BillRepository {
    async fn read(&self, id: &i64) -> Result<Option<Bill>, Error> {
        let bill = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE bill_id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(bill)
    }
}

impl Delete<i64> for BillRepository {
    /// Items and attachments cascade
    async fn delete(&self, id: &i64) -> Result<(), Error> {
        sqlx::query("DELETE FROM bills WHERE bill_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::{CreateAttachmentDTO, CreateBillItemDTO};
    use crate::repositories::AttachmentRepository;
    use sqlx::SqlitePool;

    fn new_bill(payer_id: &str) -> CreateBillDTO {
        CreateBillDTO {
            event_id: 2,
            payer_id: payer_id.to_string(),
            subtotal_cents: 500,
            tax_cents: 50,
            tip_cents: 0,
            total_cents: 550,
            currency: "INR".to_string(),
            notes: Some("Snacks".to_string()),
            items: vec![CreateBillItemDTO {
                label: "Samosa".to_string(),
                amount_cents: 250,
                quantity: 2,
            }],
            attachments: vec![CreateAttachmentDTO {
                file_name: "snacks.png".to_string(),
                url: "data:image/png;base64,AA==".to_string(),
                size_bytes: 1,
                mime_type: "image/png".to_string(),
            }],
        }
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "windows", "events", "bills")))]
    async fn test_find_by_event_newest_first(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = BillRepository::new(pool);
        let ids: Vec<i64> = repo.find_by_event(1).await?.iter().map(|b| b.bill_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(repo.count_by_event(1).await?, 2);
        assert_eq!(repo.total_for_event(1).await?, 12001);
        assert_eq!(repo.total_for_event(2).await?, 0);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "windows", "events")))]
    async fn test_create_writes_items_and_attachments(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = BillRepository::new(pool.clone());
        let bill = repo.create(&new_bill("user-alice")).await?;
        assert_eq!(bill.total_cents, 550);

        let items = repo.items_for_bills(&[bill.bill_id]).await?;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);

        let attachments = AttachmentRepository::new(pool)
            .find_by_bills(&[bill.bill_id])
            .await?;
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].uploaded_by_id, "user-alice");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "windows", "events")))]
    async fn test_create_rolls_back_on_failure(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = BillRepository::new(pool);
        // unknown payer violates the foreign key
        assert!(repo.create(&new_bill("nobody")).await.is_err());
        assert_eq!(repo.count_by_event(2).await?, 0);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "windows", "events", "bills")))]
    async fn test_delete_cascades(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = BillRepository::new(pool.clone());
        repo.delete(&1).await?;
        assert!(repo.read(&1).await?.is_none());
        assert!(repo.items_for_bills(&[1]).await?.is_empty());
        assert!(AttachmentRepository::new(pool).find_by_bills(&[1]).await?.is_empty());
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "windows", "events", "bills")))]
    async fn test_total_paid_in_confirmed_events(pool: SqlitePool) -> sqlx::Result<()> {
        let repo = BillRepository::new(pool);
        assert_eq!(repo.total_paid_in_confirmed_events("user-bob").await?, 10000);
        assert_eq!(repo.total_paid_in_confirmed_events("user-alice").await?, 2001);
        assert_eq!(repo.total_paid_in_confirmed_events("user-charlie").await?, 0);
        Ok(())
    }
}
