use super::base::Service;

#[inline]
#[must_use]
pub(crate) const fn service_fn<T>(f: T) -> ServiceFn<T> {
    ServiceFn { f }
}

#[derive(Clone)]
pub(crate) struct ServiceFn<T> {
    f: T,
}

impl<F, Request, Response, Error> Service<Request> for ServiceFn<F>
where
    F: FnMut(Request) -> Result<Response, Error>,
{
    type Response = Response;
    type Error = Error;

    #[inline]
    fn call(&mut self, request: Request) -> Result<Self::Response, Self::Error> {
        (self.f)(request)
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use super::{service_fn, Service as _};
    use crate::service::BoxCloneService;

    use alloc::boxed::Box;

    #[test]
    fn test_service() {
        let mut service = service_fn(|(left, right): (u8, u8)| Ok::<_, Infallible>(left + right));

        assert_eq!(service.call((1, 2)).unwrap(), 3);
    }

    #[test]
    fn test_boxed_clone_keeps_state_per_clone() {
        let mut calls = 0u8;
        let mut service: BoxCloneService<(), u8, Infallible> = BoxCloneService(Box::new(service_fn(move |()| {
            calls += 1;
            Ok::<_, Infallible>(calls)
        })));

        assert_eq!(service.call(()).unwrap(), 1);

        let mut cloned = service.clone();
        assert_eq!(cloned.call(()).unwrap(), 2);
        assert_eq!(service.call(()).unwrap(), 2);
    }
}
