use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use widestring::U16String;

use crate::{
    metadata::{
        FieldInfo, MethodInfo, ScopeTokenResolver, Token, TokenResolver, TypeInfo,
    },
    Error, Result,
};

/// A scope holding one entry of every commonly used kind.
pub struct SampleScope {
    pub resolver: Arc<ScopeTokenResolver>,
    pub string: Token,
    pub signature: Token,
    pub ty: Token,
    pub field: Token,
    pub method: Token,
}

impl SampleScope {
    pub fn new() -> Self {
        let scope = ScopeTokenResolver::new();

        // Keep the string first, tests rely on it being row 1
        let string = scope.add_string("Hello,\tworld");
        let signature = scope.add_signature(vec![0x00, 0x01, 0x01, 0x08]);
        let ty = scope.add_type(TypeInfo::new("System.Object"));
        let field = scope.add_field(FieldInfo::new("Demo.Program", "System.Int32", "counter"));
        let method = scope.add_method(MethodInfo::new(
            "System.Console",
            "Void",
            "WriteLine",
            ["System.String"],
        ));

        SampleScope {
            resolver: Arc::new(scope),
            string,
            signature,
            ty,
            field,
            method,
        }
    }

    // ldstr <string>; call <method>; ret
    pub fn hello_world(&self) -> Vec<u8> {
        let mut body = vec![0x72];
        body.extend_from_slice(&self.string.value().to_le_bytes());
        body.push(0x28);
        body.extend_from_slice(&self.method.value().to_le_bytes());
        body.push(0x2A);
        body
    }
}

/// A resolver that knows no tokens at all.
pub struct FailingResolver;

impl TokenResolver for FailingResolver {
    fn as_field(&self, token: Token) -> Result<FieldInfo> {
        Err(Error::Resolution {
            token,
            expected: "field",
        })
    }

    fn as_method(&self, token: Token) -> Result<MethodInfo> {
        Err(Error::Resolution {
            token,
            expected: "method",
        })
    }

    fn as_signature(&self, token: Token) -> Result<Vec<u8>> {
        Err(Error::Resolution {
            token,
            expected: "signature",
        })
    }

    fn as_string(&self, token: Token) -> Result<U16String> {
        Err(Error::Resolution {
            token,
            expected: "string",
        })
    }

    fn as_type(&self, token: Token) -> Result<TypeInfo> {
        Err(Error::Resolution {
            token,
            expected: "type",
        })
    }
}

/// Wraps a scope and counts signature lookups.
pub struct CountingResolver {
    pub inner: ScopeTokenResolver,
    signature_calls: AtomicUsize,
}

impl CountingResolver {
    pub fn new() -> Self {
        CountingResolver {
            inner: ScopeTokenResolver::new(),
            signature_calls: AtomicUsize::new(0),
        }
    }

    pub fn signature_calls(&self) -> usize {
        self.signature_calls.load(Ordering::SeqCst)
    }
}

impl TokenResolver for CountingResolver {
    fn as_field(&self, token: Token) -> Result<FieldInfo> {
        self.inner.as_field(token)
    }

    fn as_method(&self, token: Token) -> Result<MethodInfo> {
        self.inner.as_method(token)
    }

    fn as_signature(&self, token: Token) -> Result<Vec<u8>> {
        self.signature_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.as_signature(token)
    }

    fn as_string(&self, token: Token) -> Result<U16String> {
        self.inner.as_string(token)
    }

    fn as_type(&self, token: Token) -> Result<TypeInfo> {
        self.inner.as_type(token)
    }
}
