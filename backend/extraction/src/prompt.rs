//! Prompt contract for the vision capability.
//!
//! The system instruction states the exact reply schema the parser expects;
//! changing one side means changing the other.

pub const SYSTEM_PROMPT: &str = "You are a price reader. Extract prices, discounts, and time discount from a price tag image. \
Return strict JSON with fields: product_name (string or null), \
main_price (number or string or null), discount_price (number or string or null), \
discount_type (one of \"price_drop\", \"percent_off\", \"buy_x_get_y\", or null), \
time_discount (object or null with fields: time_start (string or null), time_end (string or null)), \
and what_was_read (array of strings). \
Use \"price_drop\" when two prices are shown for one product, \
\"percent_off\" when a percentage markdown is shown, \
and \"buy_x_get_y\" when gift or bundle wording is detected. \
Note that: Sometimes, when displaying prices, the digits in the thousands place are shown larger in size, \
while the digits in the hundreds, tens, and ones places are shown smaller. \
Do NOT include any other text.";

pub const USER_PROMPT: &str =
    "Read prices and time discount from this price tag. JSON only. Example main price: 195.400đ";
