// Domain pricing: static price list and the per-unit rates derived from it
// Plain lookups keyed by region, storage class or machine type

use super::problem_builder::{ensure_non_negative, ModelError, Result};
use super::value_objects::PricingMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Storage class with its monthly rates and minimum retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageClass {
    pub name: String,
    /// Per GB-month
    pub storage_rate: f64,
    /// Per GB retrieved
    pub retrieval_rate: f64,
    pub min_retention_days: u32,
    /// Whether frequently accessed data may live in this class.
    #[serde(default = "default_true")]
    pub serves_high_frequency: bool,
}

fn default_true() -> bool {
    true
}

impl StorageClass {
    pub fn new(name: &str, storage_rate: f64, retrieval_rate: f64, min_retention_days: u32) -> Self {
        Self {
            name: name.to_string(),
            storage_rate,
            retrieval_rate,
            min_retention_days,
            serves_high_frequency: true,
        }
    }

    pub fn cold(mut self) -> Self {
        self.serves_high_frequency = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MachineType {
    pub cost_per_hour: f64,
    pub vcpu: f64,
    pub memory_gb: f64,
}

/// Pricing configuration for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostTable {
    pub region: String,
    pub currency: String,
    /// On-demand query price per TiB scanned, by region.
    pub on_demand_per_tib: BTreeMap<String, f64>,
    /// Reserved slot price per slot-hour.
    pub reserved_slot_hour: f64,
    /// Data volume one reserved unit serves over the billing period.
    pub tib_per_reserved_unit: f64,
    /// Flat-rate reservation price per hour for the whole slot pool.
    pub flat_rate_hourly: f64,
    pub storage_classes: Vec<StorageClass>,
    /// Per GB of network egress.
    pub egress_rate: f64,
    /// Per read (class B) operation.
    pub class_b_ops_rate: f64,
    pub machine_types: BTreeMap<String, MachineType>,
    /// Fraction taken off the node price for spot capacity.
    pub spot_discount: f64,
    /// Fraction taken off the node price under a committed-use contract.
    pub cud_discount: f64,
    /// Persistent disk per GB-month.
    pub disk_rate: f64,
    pub load_balancer_hourly: f64,
    pub management_fee_hourly: f64,
    /// Per GB of monitoring data.
    pub monitoring_rate: f64,
    /// Monthly free-tier allowance against the management fee.
    pub free_tier_credit: f64,
    pub hours_per_month: f64,
}

impl Default for CostTable {
    fn default() -> Self {
        let on_demand_per_tib = [("us".to_string(), 6.25), ("eu".to_string(), 7.00)]
            .into_iter()
            .collect();
        let machine_types = [
            (
                "n1-standard-2".to_string(),
                MachineType {
                    cost_per_hour: 0.136,
                    vcpu: 2.0,
                    memory_gb: 7.5,
                },
            ),
            (
                "e2-standard-2".to_string(),
                MachineType {
                    cost_per_hour: 0.114,
                    vcpu: 2.0,
                    memory_gb: 8.0,
                },
            ),
        ]
        .into_iter()
        .collect();

        Self {
            region: "us".to_string(),
            currency: "USD".to_string(),
            on_demand_per_tib,
            reserved_slot_hour: 0.055,
            tib_per_reserved_unit: 100.0,
            flat_rate_hourly: 4.0,
            storage_classes: vec![
                StorageClass::new("Standard", 0.020, 0.0, 0),
                StorageClass::new("Nearline", 0.010, 0.01, 30),
                StorageClass::new("Coldline", 0.004, 0.02, 90).cold(),
                StorageClass::new("Archive", 0.0012, 0.05, 365).cold(),
            ],
            egress_rate: 0.12,
            class_b_ops_rate: 0.004 / 10_000.0,
            machine_types,
            spot_discount: 0.91,
            cud_discount: 0.70,
            disk_rate: 0.17,
            load_balancer_hourly: 0.025,
            management_fee_hourly: 0.10,
            monitoring_rate: 0.10,
            free_tier_credit: 74.40,
            hours_per_month: 730.0,
        }
    }
}

impl CostTable {
    pub fn for_region(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("reserved_slot_hour", self.reserved_slot_hour),
            ("tib_per_reserved_unit", self.tib_per_reserved_unit),
            ("flat_rate_hourly", self.flat_rate_hourly),
            ("egress_rate", self.egress_rate),
            ("class_b_ops_rate", self.class_b_ops_rate),
            ("disk_rate", self.disk_rate),
            ("load_balancer_hourly", self.load_balancer_hourly),
            ("management_fee_hourly", self.management_fee_hourly),
            ("monitoring_rate", self.monitoring_rate),
            ("free_tier_credit", self.free_tier_credit),
            ("hours_per_month", self.hours_per_month),
        ] {
            ensure_non_negative(field, value)?;
        }
        for (field, discount) in [("spot_discount", self.spot_discount), ("cud_discount", self.cud_discount)] {
            if !(0.0..=1.0).contains(&discount) {
                return Err(ModelError::invalid(field, "discount must lie in [0, 1]"));
            }
        }
        for (region, rate) in &self.on_demand_per_tib {
            ensure_non_negative(&format!("on_demand_per_tib.{}", region), *rate)?;
        }
        for class in &self.storage_classes {
            ensure_non_negative(&format!("{}.storage_rate", class.name), class.storage_rate)?;
            ensure_non_negative(&format!("{}.retrieval_rate", class.name), class.retrieval_rate)?;
        }
        for (name, machine) in &self.machine_types {
            ensure_non_negative(&format!("{}.cost_per_hour", name), machine.cost_per_hour)?;
            ensure_non_negative(&format!("{}.vcpu", name), machine.vcpu)?;
            ensure_non_negative(&format!("{}.memory_gb", name), machine.memory_gb)?;
        }
        Ok(())
    }

    /// On-demand price per TiB in `region`, falling back to the table's own region.
    pub fn on_demand_rate(&self, region: &str) -> Result<f64> {
        self.on_demand_per_tib
            .get(&region.to_lowercase())
            .or_else(|| self.on_demand_per_tib.get(&self.region))
            .copied()
            .ok_or_else(|| ModelError::UnknownPricingKey(format!("on_demand_per_tib.{}", region)))
    }

    /// Cost of one reserved unit held for `hours`.
    pub fn reserved_unit_cost(&self, hours: f64) -> f64 {
        self.reserved_slot_hour * hours
    }

    pub fn storage_class(&self, name: &str) -> Result<&StorageClass> {
        self.storage_classes
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ModelError::UnknownPricingKey(format!("storage_classes.{}", name)))
    }

    pub fn machine_type(&self, name: &str) -> Result<&MachineType> {
        self.machine_types
            .get(name)
            .ok_or_else(|| ModelError::UnknownPricingKey(format!("machine_types.{}", name)))
    }

    /// Hourly node price under `mode`.
    pub fn node_hour_rate(&self, machine_type: &str, mode: PricingMode) -> Result<f64> {
        let base = self.machine_type(machine_type)?.cost_per_hour;
        Ok(base * self.mode_multiplier(mode))
    }

    pub fn mode_multiplier(&self, mode: PricingMode) -> f64 {
        match mode {
            PricingMode::Standard => 1.0,
            PricingMode::Spot => 1.0 - self.spot_discount,
            PricingMode::CommittedUse => 1.0 - self.cud_discount,
        }
    }

    /// Persistent disk price per GB over one month.
    pub fn disk_rate_per_month(&self) -> f64 {
        self.disk_rate
    }

    /// Management fee for one cluster over one month.
    pub fn monthly_management_fee(&self) -> f64 {
        self.management_fee_hourly * self.hours_per_month
    }

    pub fn monthly_load_balancer(&self) -> f64 {
        self.load_balancer_hourly * self.hours_per_month
    }
}

/// Usage sample handed over by a metrics or billing collector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageFeed {
    pub metric_value: f64,
    pub window_days: u32,
}

impl UsageFeed {
    /// Demand projected onto a 30-day month.
    pub fn monthly_demand(&self) -> Result<f64> {
        ensure_non_negative("metric_value", self.metric_value)?;
        if self.window_days == 0 {
            return Err(ModelError::invalid("window_days", "must be at least one day"));
        }
        Ok(self.metric_value * 30.0 / f64::from(self.window_days))
    }
}
