//! Premium status and inventory, owned by external collaborators
//!
//! The engine only reads premium status. Inventory is decremented here so
//! that taking an item and activating it commit in the same transaction.

use rusqlite::{Connection, OptionalExtension, params};

use crate::domain::{PremiumStatus, UserId};
use crate::error::Result;

/// Premium status, free for unknown users
pub fn premium_status(conn: &Connection, user: &UserId) -> Result<PremiumStatus> {
    let status = conn
        .query_row(
            "SELECT is_premium, premium_expires_at FROM users WHERE user_id = ?1",
            [user.as_str()],
            |r| {
                Ok(PremiumStatus {
                    is_premium: r.get(0)?,
                    expires_at: r.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(status.unwrap_or_default())
}

pub fn set_premium(conn: &Connection, user: &UserId, status: PremiumStatus, now_ms: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO users (user_id, is_premium, premium_expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id) DO UPDATE SET
            is_premium = excluded.is_premium,
            premium_expires_at = excluded.premium_expires_at",
        params![user.as_str(), status.is_premium, status.expires_at, now_ms],
    )?;
    Ok(())
}

pub fn item_quantity(conn: &Connection, user: &UserId, item: &str) -> Result<u32> {
    let quantity = conn
        .query_row(
            "SELECT quantity FROM inventory WHERE user_id = ?1 AND item = ?2",
            params![user.as_str(), item],
            |r| r.get(0),
        )
        .optional()?;
    Ok(quantity.unwrap_or(0))
}

/// Add `quantity` of `item`. Returns the new quantity.
pub fn grant_item(conn: &Connection, user: &UserId, item: &str, quantity: u32) -> Result<u32> {
    conn.execute(
        "INSERT INTO inventory (user_id, item, quantity) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id, item) DO UPDATE SET quantity = quantity + excluded.quantity",
        params![user.as_str(), item, quantity],
    )?;
    item_quantity(conn, user, item)
}

/// Remove one `item` if the user owns any. Returns whether one was taken.
pub fn take_item(conn: &Connection, user: &UserId, item: &str) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE inventory SET quantity = quantity - 1
         WHERE user_id = ?1 AND item = ?2 AND quantity > 0",
        params![user.as_str(), item],
    )?;
    Ok(changed == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ProgressDb;

    #[test]
    fn test_premium_defaults_to_free() {
        let db = ProgressDb::open_in_memory().unwrap();
        let user = UserId::new("u1").unwrap();
        assert_eq!(premium_status(&db.conn(), &user).unwrap(), PremiumStatus::free());

        let status = PremiumStatus::active_until(Some(5_000));
        db.write(|tx| set_premium(tx, &user, status, 1)).unwrap();
        let loaded = premium_status(&db.conn(), &user).unwrap();
        assert!(loaded.is_active(4_999));
        assert!(!loaded.is_active(5_000));
    }

    #[test]
    fn test_inventory_grant_and_take() {
        let db = ProgressDb::open_in_memory().unwrap();
        let user = UserId::new("u1").unwrap();

        assert!(!db.write(|tx| take_item(tx, &user, "xp_boost")).unwrap());
        assert_eq!(db.write(|tx| grant_item(tx, &user, "xp_boost", 2)).unwrap(), 2);
        assert_eq!(db.write(|tx| grant_item(tx, &user, "xp_boost", 1)).unwrap(), 3);

        assert!(db.write(|tx| take_item(tx, &user, "xp_boost")).unwrap());
        assert_eq!(item_quantity(&db.conn(), &user, "xp_boost").unwrap(), 2);
        assert_eq!(item_quantity(&db.conn(), &user, "coin_charm").unwrap(), 0);
    }
}
