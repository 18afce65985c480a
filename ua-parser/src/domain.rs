use bitflags::bitflags;

bitflags! {
    /// Selects which domains a [`Resolver`](crate::Resolver) is asked to
    /// resolve, and which domains a [`PartialResult`](crate::PartialResult)
    /// has actually resolved.
    ///
    /// Domains are independent of one another: a caller uninterested in
    /// device data can ask for `USER_AGENT | OS` only, and a resolver must
    /// not do any extra work resolving [`Domain::DEVICE`] (though it's
    /// allowed to, the contract only requires *at least* the requested
    /// domains be resolved).
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct Domain: u8 {
        /// Browser ("user agent") domain.
        const USER_AGENT = 0b001;
        /// Operating system domain.
        const OS = 0b010;
        /// Device domain.
        const DEVICE = 0b100;
    }
}

impl Domain {
    /// All three domains at once.
    pub const ALL: Domain = Domain::USER_AGENT.union(Domain::OS).union(Domain::DEVICE);
}

#[cfg(test)]
mod tests {
    use super::Domain;

    #[test]
    fn all_is_union_of_the_three() {
        assert_eq!(Domain::ALL, Domain::USER_AGENT | Domain::OS | Domain::DEVICE);
    }

    #[test]
    fn containment() {
        let d = Domain::USER_AGENT | Domain::OS;
        assert!(d.contains(Domain::USER_AGENT));
        assert!(d.contains(Domain::OS));
        assert!(!d.contains(Domain::DEVICE));
        assert!(Domain::ALL.contains(d));
    }

    #[test]
    fn complement() {
        let d = Domain::USER_AGENT;
        assert_eq!(!d & Domain::ALL, Domain::OS | Domain::DEVICE);
    }
}
