pub mod monthly;

pub use monthly::{
    month_key, monthly_file_name, split_by_month, MonthlyIndex, MonthlyPartition,
    MonthlyPartitioner,
};
