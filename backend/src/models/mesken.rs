use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeskenStatus {
    Owned,
    OnSale,
}

impl MeskenStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MeskenStatus::Owned => "owned",
            MeskenStatus::OnSale => "on_sale",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Only the owner can modify this mesken")]
    NotOwner,
    #[error("Mesken is not on sale")]
    NotOnSale,
    #[error("Buyer already owns this mesken")]
    BuyerIsOwner,
}

/// A residential unit. Nested histories are schemaless JSON, as clients send them.
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable, AsChangeset,
)]
#[diesel(table_name = crate::schema::meskens, primary_key(mesken_id), treat_none_as_null = true)]
#[serde(rename_all = "camelCase")]
pub struct Mesken {
    pub mesken_id: String,
    pub ada_no: String,
    pub parsel_no: String,
    pub pafta_no: String,
    pub kapi_no: String,
    pub status: String,
    pub auction_info: Option<Value>,
    pub sale_history: Value,
    pub sale_info: Option<Value>,
    pub maintenance_history: Value,
    pub owner_tckn: String,
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Column widths follow the `meskens` table.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewMeskenRequest {
    #[validate(length(min = 1, max = 64, message = "meskenId must be 1 to 64 characters"))]
    pub mesken_id: String,
    #[validate(length(max = 32, message = "adaNo must be at most 32 characters"))]
    pub ada_no: String,
    #[validate(length(max = 32, message = "parselNo must be at most 32 characters"))]
    pub parsel_no: String,
    #[validate(length(max = 32, message = "paftaNo must be at most 32 characters"))]
    pub pafta_no: String,
    #[validate(length(max = 32, message = "kapiNo must be at most 32 characters"))]
    pub kapi_no: String,
    #[serde(default)]
    pub auction_info: Option<Value>,
}

/// Partial update of the cadastral fields; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MeskenChanges {
    #[validate(length(max = 32, message = "adaNo must be at most 32 characters"))]
    pub ada_no: Option<String>,
    #[validate(length(max = 32, message = "parselNo must be at most 32 characters"))]
    pub parsel_no: Option<String>,
    #[validate(length(max = 32, message = "paftaNo must be at most 32 characters"))]
    pub pafta_no: Option<String>,
    #[validate(length(max = 32, message = "kapiNo must be at most 32 characters"))]
    pub kapi_no: Option<String>,
    pub auction_info: Option<Value>,
}

impl Mesken {
    pub fn new(request: NewMeskenRequest, owner_tckn: &str, now: i64) -> Self {
        Self {
            mesken_id: request.mesken_id,
            ada_no: request.ada_no,
            parsel_no: request.parsel_no,
            pafta_no: request.pafta_no,
            kapi_no: request.kapi_no,
            status: MeskenStatus::Owned.as_str().to_string(),
            auction_info: request.auction_info,
            sale_history: json!([]),
            sale_info: None,
            maintenance_history: json!([]),
            owner_tckn: owner_tckn.to_string(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_on_sale(&self) -> bool {
        self.status == MeskenStatus::OnSale.as_str()
    }

    pub fn ensure_owner(&self, tckn: &str) -> Result<(), LifecycleError> {
        if self.owner_tckn == tckn {
            Ok(())
        } else {
            Err(LifecycleError::NotOwner)
        }
    }

    pub fn apply_changes(&mut self, changes: MeskenChanges, now: i64) {
        if let Some(ada_no) = changes.ada_no {
            self.ada_no = ada_no;
        }
        if let Some(parsel_no) = changes.parsel_no {
            self.parsel_no = parsel_no;
        }
        if let Some(pafta_no) = changes.pafta_no {
            self.pafta_no = pafta_no;
        }
        if let Some(kapi_no) = changes.kapi_no {
            self.kapi_no = kapi_no;
        }
        if let Some(auction_info) = changes.auction_info {
            self.auction_info = Some(auction_info);
        }
        self.updated_at = now;
    }

    /// Listing an already listed mesken replaces its sale info.
    pub fn put_on_sale(&mut self, sale_info: Value, now: i64) {
        self.status = MeskenStatus::OnSale.as_str().to_string();
        self.sale_info = Some(sale_info);
        self.updated_at = now;
    }

    pub fn cancel_sale(&mut self, now: i64) -> Result<(), LifecycleError> {
        if !self.is_on_sale() {
            return Err(LifecycleError::NotOnSale);
        }
        self.status = MeskenStatus::Owned.as_str().to_string();
        self.sale_info = None;
        self.updated_at = now;
        Ok(())
    }

    /// Moves ownership to `buyer` and returns the previous owner's TCKN.
    pub fn sell_to(&mut self, buyer: &str, now: i64) -> Result<String, LifecycleError> {
        if !self.is_on_sale() {
            return Err(LifecycleError::NotOnSale);
        }
        if self.owner_tckn == buyer {
            return Err(LifecycleError::BuyerIsOwner);
        }

        let seller = std::mem::replace(&mut self.owner_tckn, buyer.to_string());
        let record = json!({
            "seller": seller,
            "buyer": buyer,
            "saleInfo": self.sale_info.take().unwrap_or(Value::Null),
            "soldAt": now,
        });
        push_entry(&mut self.sale_history, record);
        self.status = MeskenStatus::Owned.as_str().to_string();
        self.updated_at = now;
        Ok(seller)
    }

    pub fn add_maintenance(&mut self, record: Value, now: i64) {
        let entry = match record {
            Value::Object(mut fields) => {
                fields.insert("recordedAt".to_string(), json!(now));
                Value::Object(fields)
            }
            other => json!({ "record": other, "recordedAt": now }),
        };
        push_entry(&mut self.maintenance_history, entry);
        self.updated_at = now;
    }
}

// Histories written by older clients may not be arrays; keep what was there.
fn push_entry(history: &mut Value, entry: Value) {
    if let Value::Array(items) = history {
        items.push(entry);
        return;
    }
    let previous = history.take();
    *history = if previous.is_null() {
        json!([entry])
    } else {
        json!([previous, entry])
    };
}
