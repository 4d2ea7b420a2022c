mod data_sample;
pub use data_sample::DataSample;

mod sorted_array;
pub(crate) use sorted_array::median_of_sorted;
pub(crate) use sorted_array::SortedArray;

mod time_series;
pub use time_series::TimeSeries;
