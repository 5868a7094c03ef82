//! Bundled sample data
//!
//! Served by the in-memory store when no backend is reachable. Product ids
//! are assigned in declaration order starting at 1, and the other records
//! refer to them by that position.

use chrono::{NaiveDate, Utc};

use crate::storage::types::{
    ApprovalStatus, InventoryRecord, Movement, Product, SalesRecord, SpecialOutboundRecord,
    VarianceReport,
};
use crate::variance::VarianceInputs;

/// Product codes of the sample catalog, in id order
pub const SAMPLE_PRODUCT_CODES: &[&str] =
    &["SP001", "SP002", "SP003", "SP004", "SP005", "SP006"];

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap_or_default()
}

pub fn products() -> Vec<Product> {
    vec![
        Product::new(SAMPLE_PRODUCT_CODES[0], "Cà phê rang xay 500g", "gói")
            .category("Đồ uống")
            .unit_price(125_000.0),
        Product::new(SAMPLE_PRODUCT_CODES[1], "Trà xanh túi lọc", "hộp")
            .category("Đồ uống")
            .unit_price(45_000.0),
        Product::new(SAMPLE_PRODUCT_CODES[2], "Gạo thơm 5kg", "bao")
            .category("Thực phẩm")
            .unit_price(110_000.0),
        Product::new(SAMPLE_PRODUCT_CODES[3], "Nước mắm 500ml", "chai")
            .category("Gia vị")
            .unit_price(38_000.0),
        Product::new(SAMPLE_PRODUCT_CODES[4], "Bánh quy bơ", "hộp")
            .category("Bánh kẹo")
            .unit_price(62_000.0),
        Product::new(SAMPLE_PRODUCT_CODES[5], "Mì gói (thùng 30)", "thùng")
            .category("Thực phẩm")
            .unit_price(105_000.0)
            .active(false),
    ]
}

pub fn inventory_records() -> Vec<InventoryRecord> {
    vec![
        InventoryRecord::new(1, day(2), Movement::Inbound, 50.0).note("Nhập hàng đầu tháng"),
        InventoryRecord::new(2, day(2), Movement::Inbound, 80.0),
        InventoryRecord::new(3, day(3), Movement::Inbound, 40.0),
        InventoryRecord::new(4, day(3), Movement::Inbound, 60.0),
        InventoryRecord::new(1, day(5), Movement::Outbound, 12.0).note("Xuất giao đại lý"),
        InventoryRecord::new(5, day(5), Movement::Inbound, 30.0),
    ]
}

pub fn sales_records() -> Vec<SalesRecord> {
    vec![
        SalesRecord::new(1, day(2), 30.0, 125_000.0).promotion(10.0),
        SalesRecord::new(2, day(2), 25.0, 45_000.0),
        SalesRecord::new(3, day(3), 12.0, 110_000.0).customer("Cửa hàng Minh Anh"),
        SalesRecord::new(4, day(4), 20.0, 38_000.0).promotion(2.0),
        SalesRecord::new(5, day(5), 8.0, 62_000.0),
    ]
}

pub fn special_outbound_records() -> Vec<SpecialOutboundRecord> {
    let mut approved = SpecialOutboundRecord::new(1, day(2), 5.0, "Hàng hỏng do ẩm", "kho");
    approved.status = ApprovalStatus::Approved;
    approved.decided_by = Some("quanly".to_string());
    approved.decided_at = Some(Utc::now());

    vec![
        approved,
        SpecialOutboundRecord::new(3, day(3), 2.0, "Xuất mẫu thử", "kho"),
    ]
}

pub fn variance_reports() -> Vec<VarianceReport> {
    vec![
        VarianceReport::new(
            1,
            day(2),
            VarianceInputs {
                beginning_inventory: 100.0,
                inbound_quantity: 50.0,
                sales_quantity: 30.0,
                promotion_quantity: 10.0,
                special_outbound_quantity: 5.0,
                actual_inventory: 100.0,
            },
        ),
        VarianceReport::new(
            2,
            day(2),
            VarianceInputs {
                beginning_inventory: 40.0,
                inbound_quantity: 80.0,
                sales_quantity: 25.0,
                promotion_quantity: 0.0,
                special_outbound_quantity: 0.0,
                actual_inventory: 80.0,
            },
        )
        .note("Kiểm kê cuối ngày"),
    ]
}
