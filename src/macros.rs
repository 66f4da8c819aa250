/// Converts between integer types, turning an overflow into
/// `Error::TryFromInt` that names both types.
#[macro_export]
macro_rules! convert_num {
    ($num: expr, $ty: ty) => {
        TryInto::<$ty>::try_into($num).context($crate::error::TryFromIntSnafu {
            from: std::any::type_name_of_val(&$num),
            to: stringify!($ty),
        })
    };
}
