//! Aggregated reports over a date range
//!
//! - Sales per product and per day, with grand totals
//! - Inventory movements per product (inbound, outbound, net)
//! - Variance reports grouped by severity

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::storage::{DateRange, InventoryStore, Movement, Product, RecordFilter, StorageResult};
use crate::variance::{assess, AssessedReport, Severity, Thresholds};

/// Sales aggregated for one product
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductSales {
    pub product_id: u32,
    pub code: Option<String>,
    pub name: Option<String>,
    pub quantity: f64,
    pub promotion_quantity: f64,
    pub revenue: f64,
    pub transactions: usize,
}

/// Sales totals for one day, or over the whole range
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SalesTotals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub quantity: f64,
    pub promotion_quantity: f64,
    pub revenue: f64,
    pub transactions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesReport {
    pub range: DateRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u32>,
    pub products: Vec<ProductSales>,
    pub daily: Vec<SalesTotals>,
    pub totals: SalesTotals,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductMovement {
    pub product_id: u32,
    pub code: Option<String>,
    pub name: Option<String>,
    pub inbound: f64,
    pub outbound: f64,
    pub net: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventorySummary {
    pub range: DateRange,
    pub products: Vec<ProductMovement>,
    pub total_inbound: f64,
    pub total_outbound: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeverityCount {
    pub severity: Severity,
    pub count: usize,
    pub total_abs_variance: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VarianceSummary {
    pub range: DateRange,
    pub report_count: usize,
    pub by_severity: Vec<SeverityCount>,
    pub total_abs_variance: f64,
    pub high: Vec<AssessedReport>,
}

/// Builds reports from the store
pub struct ReportService {
    store: Arc<dyn InventoryStore>,
    thresholds: Thresholds,
}

impl ReportService {
    pub fn new(store: Arc<dyn InventoryStore>, thresholds: Thresholds) -> Self {
        Self { store, thresholds }
    }

    pub async fn sales(
        &self,
        range: DateRange,
        product_id: Option<u32>,
    ) -> StorageResult<SalesReport> {
        let filter = filter_for(range, product_id);
        let sales = self.store.list_sales(filter).await?;
        let catalog = self.catalog().await?;

        let mut by_product: BTreeMap<u32, ProductSales> = BTreeMap::new();
        let mut by_day: BTreeMap<NaiveDate, SalesTotals> = BTreeMap::new();
        let mut totals = SalesTotals::default();

        for sale in &sales {
            let revenue = sale.revenue();

            let entry = by_product.entry(sale.product_id).or_insert_with(|| {
                let product = catalog.get(&sale.product_id);
                ProductSales {
                    product_id: sale.product_id,
                    code: product.map(|p| p.code.clone()),
                    name: product.map(|p| p.name.clone()),
                    quantity: 0.0,
                    promotion_quantity: 0.0,
                    revenue: 0.0,
                    transactions: 0,
                }
            });
            entry.quantity += sale.quantity;
            entry.promotion_quantity += sale.promotion_quantity;
            entry.revenue += revenue;
            entry.transactions += 1;

            let day = by_day.entry(sale.sale_date).or_insert_with(|| SalesTotals {
                date: Some(sale.sale_date),
                ..Default::default()
            });
            day.add(sale.quantity, sale.promotion_quantity, revenue);
            totals.add(sale.quantity, sale.promotion_quantity, revenue);
        }

        Ok(SalesReport {
            range,
            product_id,
            products: by_product.into_values().collect(),
            daily: by_day.into_values().collect(),
            totals,
        })
    }

    pub async fn inventory(
        &self,
        range: DateRange,
        product_id: Option<u32>,
    ) -> StorageResult<InventorySummary> {
        let records = self
            .store
            .list_inventory(filter_for(range, product_id))
            .await?;
        let catalog = self.catalog().await?;

        let mut by_product: BTreeMap<u32, ProductMovement> = BTreeMap::new();
        for record in &records {
            let entry = by_product.entry(record.product_id).or_insert_with(|| {
                let product = catalog.get(&record.product_id);
                ProductMovement {
                    product_id: record.product_id,
                    code: product.map(|p| p.code.clone()),
                    name: product.map(|p| p.name.clone()),
                    inbound: 0.0,
                    outbound: 0.0,
                    net: 0.0,
                }
            });
            match record.movement {
                Movement::Inbound => entry.inbound += record.quantity,
                Movement::Outbound => entry.outbound += record.quantity,
            }
            entry.net = entry.inbound - entry.outbound;
        }

        let products: Vec<ProductMovement> = by_product.into_values().collect();
        Ok(InventorySummary {
            range,
            total_inbound: products.iter().map(|p| p.inbound).sum(),
            total_outbound: products.iter().map(|p| p.outbound).sum(),
            products,
        })
    }

    pub async fn variance(
        &self,
        range: DateRange,
        product_id: Option<u32>,
    ) -> StorageResult<VarianceSummary> {
        let reports = self
            .store
            .list_variance_reports(filter_for(range, product_id))
            .await?;

        let mut counts: BTreeMap<Severity, (usize, f64)> =
            Severity::all().iter().map(|s| (*s, (0, 0.0))).collect();
        let mut high = Vec::new();
        let report_count = reports.len();

        for report in reports {
            let assessment = assess(&report.inputs, &self.thresholds);
            let slot = counts.entry(assessment.severity).or_insert((0, 0.0));
            slot.0 += 1;
            slot.1 += assessment.figures.variance.abs();

            if assessment.severity == Severity::High {
                high.push(AssessedReport { report, assessment });
            }
        }

        let by_severity: Vec<SeverityCount> = counts
            .into_iter()
            .map(|(severity, (count, total_abs_variance))| SeverityCount {
                severity,
                count,
                total_abs_variance,
            })
            .collect();

        Ok(VarianceSummary {
            range,
            report_count,
            total_abs_variance: by_severity.iter().map(|s| s.total_abs_variance).sum(),
            by_severity,
            high,
        })
    }

    async fn catalog(&self) -> StorageResult<HashMap<u32, Product>> {
        Ok(self
            .store
            .list_products()
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect())
    }
}

impl SalesTotals {
    fn add(&mut self, quantity: f64, promotion: f64, revenue: f64) {
        self.quantity += quantity;
        self.promotion_quantity += promotion;
        self.revenue += revenue;
        self.transactions += 1;
    }
}

fn filter_for(range: DateRange, product_id: Option<u32>) -> RecordFilter {
    let filter = RecordFilter::new().range(range);
    match product_id {
        Some(id) => filter.product(id),
        None => filter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InventoryRecord, MemoryStore, SalesRecord, VarianceReport};
    use crate::variance::VarianceInputs;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn range() -> DateRange {
        DateRange::try_new(day(1), day(31)).unwrap()
    }

    async fn setup() -> (Arc<dyn InventoryStore>, ReportService, u32, u32) {
        let store: Arc<dyn InventoryStore> = Arc::new(MemoryStore::new());
        let tea = store
            .insert_product(Product::new("TEA", "Tea", "box"))
            .await
            .unwrap();
        let coffee = store
            .insert_product(Product::new("COF", "Coffee", "bag"))
            .await
            .unwrap();
        let service = ReportService::new(Arc::clone(&store), Thresholds::default());
        (store, service, tea.id, coffee.id)
    }

    #[tokio::test]
    async fn test_sales_report() {
        let (store, service, tea, coffee) = setup().await;
        for sale in [
            SalesRecord::new(tea, day(2), 3.0, 10.0),
            SalesRecord::new(tea, day(3), 2.0, 10.0).promotion(1.0),
            SalesRecord::new(coffee, day(3), 1.0, 50.0),
            SalesRecord::new(coffee, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 9.0, 50.0),
        ] {
            store.insert_sale(sale).await.unwrap();
        }

        let report = service.sales(range(), None).await.unwrap();

        assert_eq!(report.products.len(), 2);
        let tea_sales = report.products.iter().find(|p| p.product_id == tea).unwrap();
        assert_eq!(tea_sales.quantity, 5.0);
        assert_eq!(tea_sales.promotion_quantity, 1.0);
        assert_eq!(tea_sales.revenue, 50.0);
        assert_eq!(tea_sales.transactions, 2);
        assert_eq!(tea_sales.code.as_deref(), Some("TEA"));

        assert_eq!(report.daily.len(), 2);
        assert_eq!(report.daily[1].date, Some(day(3)));
        assert_eq!(report.daily[1].revenue, 70.0);

        assert_eq!(report.totals.revenue, 100.0);
        assert_eq!(report.totals.transactions, 3);
    }

    #[tokio::test]
    async fn test_sales_report_single_product() {
        let (store, service, tea, coffee) = setup().await;
        store
            .insert_sale(SalesRecord::new(tea, day(2), 3.0, 10.0))
            .await
            .unwrap();
        store
            .insert_sale(SalesRecord::new(coffee, day(2), 1.0, 50.0))
            .await
            .unwrap();

        let report = service.sales(range(), Some(coffee)).await.unwrap();
        assert_eq!(report.products.len(), 1);
        assert_eq!(report.totals.revenue, 50.0);
    }

    #[tokio::test]
    async fn test_inventory_summary() {
        let (store, service, tea, _) = setup().await;
        for record in [
            InventoryRecord::new(tea, day(1), Movement::Inbound, 20.0),
            InventoryRecord::new(tea, day(2), Movement::Outbound, 5.0),
            InventoryRecord::new(tea, day(4), Movement::Inbound, 2.5),
        ] {
            store.insert_inventory(record).await.unwrap();
        }

        let summary = service.inventory(range(), None).await.unwrap();
        assert_eq!(summary.products.len(), 1);
        assert_eq!(summary.products[0].inbound, 22.5);
        assert_eq!(summary.products[0].outbound, 5.0);
        assert_eq!(summary.products[0].net, 17.5);
        assert_eq!(summary.total_inbound, 22.5);
    }

    #[tokio::test]
    async fn test_variance_summary() {
        let (store, service, tea, coffee) = setup().await;
        let inputs = |actual: f64| VarianceInputs {
            beginning_inventory: 100.0,
            actual_inventory: actual,
            ..Default::default()
        };
        store
            .save_variance_report(VarianceReport::new(tea, day(1), inputs(100.0)))
            .await
            .unwrap();
        store
            .save_variance_report(VarianceReport::new(tea, day(2), inputs(97.0)))
            .await
            .unwrap();
        store
            .save_variance_report(VarianceReport::new(coffee, day(2), inputs(85.0)))
            .await
            .unwrap();

        let summary = service.variance(range(), None).await.unwrap();

        assert_eq!(summary.report_count, 3);
        assert_eq!(summary.total_abs_variance, 18.0);
        assert_eq!(summary.by_severity.len(), 4);

        let count = |s: Severity| {
            summary
                .by_severity
                .iter()
                .find(|c| c.severity == s)
                .map(|c| c.count)
                .unwrap()
        };
        assert_eq!(count(Severity::None), 1);
        assert_eq!(count(Severity::Low), 1);
        assert_eq!(count(Severity::High), 1);

        assert_eq!(summary.high.len(), 1);
        assert_eq!(summary.high[0].report.product_id, coffee);
    }
}
