mod test_utils;

mod initialization;
