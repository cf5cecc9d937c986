use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// 对象销毁时执行一次的清理回调。
pub type Disposable = Box<dyn FnOnce()>;

type Subscriber<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct ObservableInner<T> {
    value: T,
    next_id: u64,
    subscribers: Vec<(u64, Subscriber<T>)>,
}

/// 单线程信号：保存当前值，值变化时同步通知订阅者。
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// 更新值；与旧值相等时不触发订阅者，返回是否发生变化。
    pub fn set(&self, value: T) -> bool {
        let subscribers: Vec<Subscriber<T>> = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            inner.value = value.clone();
            inner
                .subscribers
                .iter()
                .map(|(_, subscriber)| Rc::clone(subscriber))
                .collect()
        };
        // 回调期间不持有借用，订阅者可以读取或退订
        for subscriber in subscribers {
            let mut callback = subscriber.borrow_mut();
            (&mut *callback)(&value);
        }
        true
    }

    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription<T> {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let subscriber: Subscriber<T> = Rc::new(RefCell::new(callback));
        inner.subscribers.push((id, subscriber));
        Subscription {
            id,
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

/// 订阅句柄；`Observable` 已被释放时退订是空操作。
pub struct Subscription<T> {
    id: u64,
    inner: Weak<RefCell<ObservableInner<T>>>,
}

impl<T: 'static> Subscription<T> {
    pub fn unsubscribe(self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .borrow_mut()
                .subscribers
                .retain(|(id, _)| *id != self.id);
        }
    }

    pub fn into_disposable(self) -> Disposable {
        Box::new(move || self.unsubscribe())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn set_notifies_only_on_change() {
        let signal = Observable::new(1);
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let _subscription = signal.subscribe(move |value| {
            assert_eq!(*value, 2);
            counter.set(counter.get() + 1);
        });

        assert!(signal.set(2));
        assert!(!signal.set(2));
        assert_eq!(calls.get(), 1);
        assert_eq!(signal.get(), 2);
    }

    #[test]
    fn unsubscribe_stops_callbacks() {
        let signal = Observable::new(String::from("m"));
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let subscription = signal.subscribe(move |_| counter.set(counter.get() + 1));
        assert_eq!(signal.subscriber_count(), 1);

        let dispose = subscription.into_disposable();
        dispose();
        assert_eq!(signal.subscriber_count(), 0);
        signal.set(String::from("ft"));
        assert_eq!(calls.get(), 0);
    }
}
