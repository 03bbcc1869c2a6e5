#![doc = include_str!("../README.md")]

use chrono::Utc;
use funcall_catalog::FunctionCatalog;
use funcall_types::{Function, FunctionSignature};
use serde::Deserialize;
use serde_json::{Value, json};

/// Builds the catalog the demo resolver dispatches against.
///
/// Registration order matches `descriptions.json`, so the advertised
/// signatures line up with the descriptor file record for record.
pub fn catalog() -> FunctionCatalog {
    let mut catalog = FunctionCatalog::new();
    catalog.register(WorkOrdersByAccount);
    catalog.register(WorkOrderDetails);
    catalog.register(MultipleWorkOrderDetails);
    catalog.register(CurrentDatetime);
    catalog
}

/// Work-order ids are zero-padded to five digits in the backing store.
fn pad_id(id: &str) -> String {
    format!("{id:0>5}")
}

/// Mock detail lookup. Unknown ids return an empty object rather than
/// an error, so the model sees "nothing found" instead of a failure.
fn work_order_details(id: &str) -> Value {
    match pad_id(id).as_str() {
        "00052" => json!({
            "createdOn": "06/22/2023",
            "work_order_type": "installation",
            "status": "in progress",
            "summary": "install car tires",
        }),
        "00042" => json!({
            "createdOn": "06/22/2023",
            "work_order_type": "repair",
            "status": "pending",
            "summary": "fix car",
        }),
        "52341" => json!({
            "createdOn": "06/22/2023",
            "work_order_type": "installation",
            "status": "in progress",
            "summary": "tow hitch",
        }),
        _ => json!({}),
    }
}

#[derive(Debug, Deserialize)]
pub struct AccountArgs {
    pub account_id: String,
}

/// Lists the work orders attached to an account. The mock backend has a
/// single account, so every id gets the same answer.
pub struct WorkOrdersByAccount;

impl Function for WorkOrdersByAccount {
    const NAME: &'static str = "get_work_orders_by_account";

    type Args = AccountArgs;
    type Output = Value;
    type Error = std::convert::Infallible;

    fn signature(&self) -> FunctionSignature {
        FunctionSignature {
            name: Self::NAME.to_string(),
            description: "Gets the list of work orders for an account".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "account_id": {
                        "type": "string",
                        "description": "The account id",
                    },
                },
                "required": ["account_id"],
            }),
        }
    }

    async fn invoke(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        tracing::debug!(account_id = %args.account_id, "listing work orders");
        Ok(json!([
            { "work_order_id": "00052" },
            { "work_order_id": "00042" },
            { "work_order_id": "52341" },
        ]))
    }
}

#[derive(Debug, Deserialize)]
pub struct WorkOrderArgs {
    pub work_order_id: String,
}

/// Looks up the details of a single work order.
pub struct WorkOrderDetails;

impl Function for WorkOrderDetails {
    const NAME: &'static str = "get_work_order_details";

    type Args = WorkOrderArgs;
    type Output = Value;
    type Error = std::convert::Infallible;

    fn signature(&self) -> FunctionSignature {
        FunctionSignature {
            name: Self::NAME.to_string(),
            description: "Gets the details of a work order".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "work_order_id": {
                        "type": "string",
                        "description": "The work order id",
                    },
                },
                "required": ["work_order_id"],
            }),
        }
    }

    async fn invoke(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        Ok(work_order_details(&args.work_order_id))
    }
}

#[derive(Debug, Deserialize)]
pub struct WorkOrderBatchArgs {
    pub work_order_ids: Vec<String>,
}

/// Batch variant of [`WorkOrderDetails`]. Models routinely ask for every
/// id they just listed, and one call beats a round trip per id.
pub struct MultipleWorkOrderDetails;

impl Function for MultipleWorkOrderDetails {
    const NAME: &'static str = "get_multiple_work_order_details";

    type Args = WorkOrderBatchArgs;
    type Output = Value;
    type Error = std::convert::Infallible;

    fn signature(&self) -> FunctionSignature {
        FunctionSignature {
            name: Self::NAME.to_string(),
            description: "Gets the details of multiple work orders by their ids".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "work_order_ids": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "The work order ids",
                    },
                },
                "required": ["work_order_ids"],
            }),
        }
    }

    async fn invoke(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let details = args
            .work_order_ids
            .iter()
            .map(|id| work_order_details(id))
            .collect::<Vec<_>>();
        Ok(Value::Array(details))
    }
}

#[derive(Debug, Deserialize)]
pub struct NoArgs {}

/// Reports the current UTC date and time, for questions like "which
/// work orders were created this month?".
pub struct CurrentDatetime;

impl Function for CurrentDatetime {
    const NAME: &'static str = "get_current_datetime";

    type Args = NoArgs;
    type Output = Value;
    type Error = std::convert::Infallible;

    fn signature(&self) -> FunctionSignature {
        FunctionSignature {
            name: Self::NAME.to_string(),
            description: "Gets the current date and time, UTC".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {},
            }),
        }
    }

    async fn invoke(&self, _args: Self::Args) -> Result<Self::Output, Self::Error> {
        Ok(json!({ "current_datetime_utc": Utc::now().to_rfc3339() }))
    }
}
