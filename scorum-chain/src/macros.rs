// if condition, then fail_with
//
// `if_cond_fail_with!(a == b, MyError)`
//
// `if a == b { Err(MyError.into()) } else { Ok(()) }`
macro_rules! if_cond_fail_with(
    ($cond: expr, $err: expr) => {
        if $cond {
            Err($crate::error::Error::from($err))
        } else {
            Ok(())
        }
    };
);

// fail with `$err` unless the condition holds
macro_rules! ensure(
    ($cond: expr, $err: expr) => {
        if_cond_fail_with!(!($cond), $err)
    };
);
